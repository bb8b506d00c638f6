use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::CookieJar;
use sqlx::prelude::FromRow;
use tracing::warn;

use crate::{utils::app_error::AppError, AppState};

#[derive(FromRow)]
pub struct InnerAuthUser {
    pub id: i64,
    pub username: String,
}

/// Resolves the `session` cookie to an account. `AuthUser(None)` means the
/// caller is not connected ; routes decide whether that is acceptable.
pub struct AuthUser(pub Option<InnerAuthUser>);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let cookies = CookieJar::from_request_parts(parts, state).await.unwrap();

        let token = match cookies.get("session") {
            Some(cookie) => cookie.value().to_string(),
            None => return Ok(AuthUser(None)),
        };

        match sqlx::query_as::<_, InnerAuthUser>("SELECT id, username FROM users WHERE token = $1")
            .bind(&token)
            .fetch_optional(&app_state.pool)
            .await
        {
            Ok(user) => Ok(AuthUser(user)),
            Err(e) => {
                warn!("Error getting auth user from database : {e}");
                Err(AppError::internal_server_error())
            }
        }
    }
}
