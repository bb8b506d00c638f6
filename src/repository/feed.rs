use sqlx::PgPool;
use tracing::warn;

use super::{PostRecord, POST_COLUMNS};
use crate::models::post::PublicPost;
use crate::utils::app_error::AppError;

/// Read-only view over the posts, newest first. The `id` tie-break keeps
/// the ordering stable when several posts share a timestamp.
pub struct FeedAssembler {
    pool: PgPool,
}

impl FeedAssembler {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self) -> Result<Vec<PublicPost>, AppError> {
        let query = format!(
            "SELECT {POST_COLUMNS} FROM posts p JOIN users u ON u.id = p.author_id \
             ORDER BY p.created_at DESC, p.id DESC"
        );

        let records = sqlx::query_as::<_, PostRecord>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!("Error getting the feed from database : {e}");
                AppError::internal_server_error()
            })?;

        Ok(records.into_iter().map(PublicPost::from).collect())
    }

    pub async fn list_by_account(&self, account_id: i64) -> Result<Vec<PublicPost>, AppError> {
        let query = format!(
            "SELECT {POST_COLUMNS} FROM posts p JOIN users u ON u.id = p.author_id \
             WHERE p.author_id = $1 ORDER BY p.created_at DESC, p.id DESC"
        );

        let records = sqlx::query_as::<_, PostRecord>(&query)
            .bind(account_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!("Error getting the posts of account {account_id} from database : {e}");
                AppError::internal_server_error()
            })?;

        Ok(records.into_iter().map(PublicPost::from).collect())
    }

    pub async fn list_mine(&self, caller_account_id: i64) -> Result<Vec<PublicPost>, AppError> {
        self.list_by_account(caller_account_id).await
    }
}
