use tracing::warn;

use super::app_error::AppError;

pub const MAX_POST_TEXT_LENGTH: usize = 500;
pub const MAX_COMMENT_TEXT_LENGTH: usize = 200;

/// A post needs a text or an image (or both) ; the text is capped at 500
/// characters. Both arguments are expected to be already trimmed.
pub fn check_new_post_data(author_id: i64, text: &str, image: &str) -> Result<(), AppError> {
    if text.is_empty() && image.is_empty() {
        warn!("User {author_id} tried to create a post with neither text nor image");
        return Err(AppError::validation_error(
            "Un post doit contenir un texte ou une image.",
        ));
    }

    let length = text.chars().count();
    if length > MAX_POST_TEXT_LENGTH {
        warn!(
            "User {author_id} tried to create a post with a text with a wrong length : {length}/{MAX_POST_TEXT_LENGTH}"
        );
        return Err(AppError::validation_error(
            "Le texte d'un post doit contenir au maximum 500 caractères.",
        ));
    }

    Ok(())
}

pub fn check_comment_text(author_id: i64, text: &str) -> Result<(), AppError> {
    if text.is_empty() {
        warn!("User {author_id} tried to post an empty comment");
        return Err(AppError::validation_error(
            "Un commentaire ne peut pas être vide.",
        ));
    }

    let length = text.chars().count();
    if length > MAX_COMMENT_TEXT_LENGTH {
        warn!(
            "User {author_id} tried to post a comment with a wrong length : {length}/{MAX_COMMENT_TEXT_LENGTH}"
        );
        return Err(AppError::validation_error(
            "Un commentaire doit contenir au maximum 200 caractères.",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use hyper::StatusCode;

    use super::*;

    #[test]
    fn post_without_text_nor_image_is_rejected() {
        let error = check_new_post_data(1, "", "").unwrap_err();
        assert_eq!(error.status_code, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn post_with_only_text_is_accepted() {
        assert!(check_new_post_data(1, "hello", "").is_ok());
    }

    #[test]
    fn post_with_only_image_is_accepted() {
        assert!(check_new_post_data(1, "", "data:image/png;base64,iVBORw0KGgo").is_ok());
    }

    #[test]
    fn post_text_limit_counts_characters_not_bytes() {
        let at_limit = "é".repeat(MAX_POST_TEXT_LENGTH);
        assert!(check_new_post_data(1, &at_limit, "").is_ok());

        let too_long = "é".repeat(MAX_POST_TEXT_LENGTH + 1);
        let error = check_new_post_data(1, &too_long, "").unwrap_err();
        assert_eq!(error.status_code, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn empty_comment_is_rejected() {
        let error = check_comment_text(1, "").unwrap_err();
        assert_eq!(error.status_code, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn comment_at_limit_is_accepted() {
        let at_limit = "a".repeat(MAX_COMMENT_TEXT_LENGTH);
        assert!(check_comment_text(1, &at_limit).is_ok());

        let too_long = "a".repeat(MAX_COMMENT_TEXT_LENGTH + 1);
        assert!(check_comment_text(1, &too_long).is_err());
    }
}
