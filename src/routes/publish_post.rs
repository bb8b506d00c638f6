use std::sync::Arc;

use axum::{extract::State, Json};
use hyper::StatusCode;
use tracing::warn;

use crate::extractors::auth_extractor::AuthUser;
use crate::models::post::PublicPost;
use crate::utils::app_error::AppError;
use crate::AppState;

#[derive(serde::Deserialize)]
pub struct NewPost {
    pub text: Option<String>,
    pub image: Option<String>,
}

pub async fn publish_post_route(
    State(app_state): State<Arc<AppState>>,
    AuthUser(auth_user): AuthUser,
    Json(new_post): Json<NewPost>,
) -> Result<(StatusCode, Json<PublicPost>), AppError> {
    let Some(auth_user) = auth_user else {
        warn!("User not connected");
        return Err(AppError::you_have_to_be_connected_to_perform_this_action_error());
    };

    let post = app_state
        .posts
        .create(
            auth_user.id,
            new_post.text.as_deref().unwrap_or(""),
            new_post.image.as_deref().unwrap_or(""),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(post)))
}
