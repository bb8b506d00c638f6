use base64::{engine::general_purpose, Engine};
use email_address::EmailAddress;
use rand::RngCore;
use sha2::{Digest, Sha512};
use tracing::warn;

use crate::structs::register_user::RegisterUser;
use crate::utils::app_error::AppError;

pub fn check_username(username: &str) -> Result<(), AppError> {
    if username.len() < 5 || username.len() > 12 {
        warn!("Wrong username size : {username}");
        return Err(AppError::validation_error(
            "Le nom d'utilisateur doit contenir entre 5 et 12 caractères.",
        ));
    }

    for (i, c) in username.char_indices() {
        if i == 0 {
            if !c.is_alphabetic() {
                warn!("The username has to begin with a letter : {username}");
                return Err(AppError::validation_error(
                    "Le nom d'utilisateur doit commencer par une lettre.",
                ));
            }
            continue;
        }
        if !c.is_alphanumeric() && c != '_' {
            warn!("The username has to contain only letters, digits and underscores : {username}");
            return Err(AppError::validation_error("Le nom d'utilisateur ne doit contenir que des lettres, des chiffres et des underscores."));
        }
    }

    Ok(())
}

pub fn check_email_address(email: &str) -> Result<(), AppError> {
    if !EmailAddress::is_valid(email) {
        warn!("Invalid email `{email}`");
        return Err(AppError::validation_error("L'email est invalide."));
    }
    Ok(())
}

pub fn check_register_infos(user: &RegisterUser) -> Result<(), AppError> {
    check_username(&user.username)?;

    check_email_address(&user.email)?;

    if user.password.len() < 8 {
        warn!("Password too short for user `{}`", user.username);
        return Err(AppError::validation_error("Mot de passe trop court."));
    }

    Ok(())
}

pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(password);
    format!("{:x}", hasher.finalize())
}

/// Opaque session token carried by the `session` cookie and stored on the
/// user row.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(check_username("alice").is_ok());
        assert!(check_username("alice_42").is_ok());
        // too short, too long
        assert!(check_username("ab").is_err());
        assert!(check_username("averylongusername").is_err());
        // must begin with a letter, no exotic characters
        assert!(check_username("1alice").is_err());
        assert!(check_username("ali-ce").is_err());
    }

    #[test]
    fn email_rules() {
        assert!(check_email_address("alice@example.org").is_ok());
        assert!(check_email_address("not an email").is_err());
    }

    #[test]
    fn password_hash_is_stable_hex() {
        let hash = hash_password("correct horse");
        assert_eq!(hash, hash_password("correct horse"));
        assert_eq!(hash.len(), 128);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(hash, hash_password("battery staple"));
    }

    #[test]
    fn session_tokens_are_unique_and_cookie_safe() {
        let first = generate_session_token();
        let second = generate_session_token();
        assert_ne!(first, second);
        assert_eq!(first.len(), 43);
        assert!(first
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
