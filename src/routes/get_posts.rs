use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use tracing::warn;

use crate::extractors::auth_extractor::AuthUser;
use crate::models::post::PublicPost;
use crate::utils::app_error::AppError;
use crate::AppState;

pub async fn get_posts_route(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<PublicPost>>, AppError> {
    Ok(Json(app_state.feed.list_all().await?))
}

pub async fn get_account_posts_route(
    State(app_state): State<Arc<AppState>>,
    Path(account_id): Path<i64>,
) -> Result<Json<Vec<PublicPost>>, AppError> {
    Ok(Json(app_state.feed.list_by_account(account_id).await?))
}

pub async fn get_my_posts_route(
    State(app_state): State<Arc<AppState>>,
    AuthUser(auth_user): AuthUser,
) -> Result<Json<Vec<PublicPost>>, AppError> {
    let Some(auth_user) = auth_user else {
        warn!("User not connected");
        return Err(AppError::you_have_to_be_connected_to_perform_this_action_error());
    };

    Ok(Json(app_state.feed.list_mine(auth_user.id).await?))
}
