use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use tracing::warn;

use crate::extractors::auth_extractor::AuthUser;
use crate::models::post::PublicPost;
use crate::utils::app_error::AppError;
use crate::AppState;

#[derive(serde::Deserialize)]
pub struct NewComment {
    pub text: String,
}

pub async fn comment_post_route(
    State(app_state): State<Arc<AppState>>,
    AuthUser(auth_user): AuthUser,
    Path(post_id): Path<i64>,
    Json(new_comment): Json<NewComment>,
) -> Result<Json<PublicPost>, AppError> {
    let Some(auth_user) = auth_user else {
        warn!("User not connected");
        return Err(AppError::you_have_to_be_connected_to_perform_this_action_error());
    };

    let post = app_state
        .posts
        .add_comment(post_id, auth_user.id, &new_comment.text)
        .await?;

    Ok(Json(post))
}
