use std::sync::Arc;

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use hyper::StatusCode;
use tracing::warn;

use crate::structs::register_user::RegisterUser;
use crate::utils::app_error::AppError;
use crate::utils::register::{check_register_infos, generate_session_token, hash_password};
use crate::AppState;

pub async fn register_route(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(mut register_user): Json<RegisterUser>,
) -> Result<(CookieJar, StatusCode), AppError> {
    register_user.username = register_user.username.to_lowercase();
    register_user.email = register_user.email.to_lowercase();
    check_register_infos(&register_user)?;

    let password = hash_password(&register_user.password);

    //Check if email is already used
    if sqlx::query("SELECT id FROM users WHERE email = $1")
        .bind(&register_user.email)
        .fetch_optional(&app_state.pool)
        .await
        .map_err(|e| {
            warn!("Error while checking if email address already exists : {e}");
            AppError::internal_server_error()
        })?
        .is_some()
    {
        warn!("Email address `{}` already used", register_user.email);
        return Err(AppError::validation_error("Adresse email déjà utilisée."));
    }

    //Check if username is already used
    if sqlx::query("SELECT id FROM users WHERE username = $1")
        .bind(&register_user.username)
        .fetch_optional(&app_state.pool)
        .await
        .map_err(|e| {
            warn!("Error while checking if username already exists : {e}");
            AppError::internal_server_error()
        })?
        .is_some()
    {
        warn!("Username `{}` already used", register_user.username);
        return Err(AppError::validation_error("Pseudo déjà utilisé."));
    }

    let token = generate_session_token();

    sqlx::query("INSERT INTO users (username, email, password, token) VALUES ($1, $2, $3, $4)")
        .bind(&register_user.username)
        .bind(&register_user.email)
        .bind(&password)
        .bind(&token)
        .execute(&app_state.pool)
        .await
        .map_err(|e| {
            warn!(
                "Error inserting user `{}` in database : {e}",
                register_user.username
            );
            AppError::internal_server_error()
        })?;

    let cookie = Cookie::build("session", token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();

    Ok((jar.add(cookie), StatusCode::CREATED))
}
