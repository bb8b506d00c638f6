use std::sync::Arc;

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use hyper::StatusCode;
use sqlx::prelude::FromRow;
use tracing::warn;

use crate::structs::login_user::LoginUser;
use crate::utils::app_error::AppError;
use crate::utils::register::{check_email_address, check_username, hash_password};
use crate::AppState;

#[derive(FromRow)]
struct UserForLogin {
    token: String,
}

pub async fn login_route(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(login_user): Json<LoginUser>,
) -> Result<(CookieJar, StatusCode), AppError> {
    let username_or_email = login_user.username_or_email.to_lowercase();
    let password = hash_password(&login_user.password);
    drop(login_user);

    let user = if username_or_email.contains('@') {
        check_email_address(&username_or_email)?;
        sqlx::query_as::<_, UserForLogin>(
            "SELECT token FROM users WHERE email = $1 AND password = $2",
        )
        .bind(&username_or_email)
        .bind(&password)
        .fetch_optional(&app_state.pool)
        .await
        .map_err(|e| {
            warn!("Error getting user with email `{username_or_email}` from database : {e}");
            AppError::internal_server_error()
        })?
    } else {
        check_username(&username_or_email)?;
        sqlx::query_as::<_, UserForLogin>(
            "SELECT token FROM users WHERE username = $1 AND password = $2",
        )
        .bind(&username_or_email)
        .bind(&password)
        .fetch_optional(&app_state.pool)
        .await
        .map_err(|e| {
            warn!("Error getting user @{username_or_email} from database : {e}");
            AppError::internal_server_error()
        })?
    };

    let Some(user) = user else {
        warn!("Failed login for `{username_or_email}`");
        return Err(AppError::new(
            StatusCode::UNAUTHORIZED,
            Some("Identifiants invalides."),
        ));
    };

    let cookie = Cookie::build("session", user.token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();

    Ok((jar.add(cookie), StatusCode::OK))
}
