use std::future::Future;

use sqlx::prelude::FromRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use tracing::warn;

use super::{PostRecord, POST_COLUMNS};
use crate::models::account::PublicAccount;
use crate::models::post::PublicPost;
use crate::utils::app_error::AppError;
use crate::utils::post::{check_comment_text, check_new_post_data};

/// Owns every write to the posts table. Each mutation is one transaction :
/// the post row is locked (`FOR UPDATE`), rewritten in memory and stored
/// back, so concurrent likes/comments on the same post serialize at the
/// storage layer instead of losing each other's update.
pub struct PostRepository {
    pool: PgPool,
}

enum MutationError {
    App(AppError),
    /// Storage failure before the commit was issued ; nothing landed.
    Storage(sqlx::Error),
    /// Failure of the commit call itself.
    Commit(sqlx::Error),
}

impl From<sqlx::Error> for MutationError {
    fn from(error: sqlx::Error) -> Self {
        Self::Storage(error)
    }
}

// serialization_failure and deadlock_detected : the transaction was rolled
// back, nothing was written.
fn is_serialization_rollback(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(e) => matches!(e.code().as_deref(), Some("40001") | Some("40P01")),
        _ => false,
    }
}

fn is_transient(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut)
        || is_serialization_rollback(error)
}

impl MutationError {
    /// Whether re-running the whole mutation is safe. A commit that fails
    /// on a broken connection may still have landed, and re-running a
    /// toggle would then flip it back ; only a serialization rollback is
    /// retried at that point, since the transaction is known not to have
    /// been applied.
    fn can_retry(&self) -> bool {
        match self {
            MutationError::App(_) => false,
            MutationError::Storage(error) => is_transient(error),
            MutationError::Commit(error) => is_serialization_rollback(error),
        }
    }
}

fn surface_error(error: MutationError, action: &str, post_id: i64) -> AppError {
    match error {
        MutationError::App(error) => error,
        MutationError::Storage(error) | MutationError::Commit(error) => {
            warn!("Error while {action} on post {post_id} : {error}");
            AppError::internal_server_error()
        }
    }
}

impl PostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_account(&self, account_id: i64) -> Result<Option<PublicAccount>, AppError> {
        sqlx::query_as::<_, PublicAccount>("SELECT id, username FROM users WHERE id = $1")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!("Error getting account {account_id} from database : {e}");
                AppError::internal_server_error()
            })
    }

    /// Creates a post. The text and the image are trimmed first ; at least
    /// one of them has to remain non-empty.
    pub async fn create(
        &self,
        author_id: i64,
        text: &str,
        image: &str,
    ) -> Result<PublicPost, AppError> {
        let text = text.trim();
        let image = image.trim();
        check_new_post_data(author_id, text, image)?;

        let author = self.find_account(author_id).await?.ok_or_else(|| {
            warn!("Unknown account {author_id} tried to create a post");
            AppError::not_found_error("Compte introuvable.")
        })?;

        #[derive(FromRow)]
        struct InsertedPost {
            id: i64,
            created_at: OffsetDateTime,
            updated_at: OffsetDateTime,
        }

        let inserted = sqlx::query_as::<_, InsertedPost>(
            "INSERT INTO posts (author_id, text, image) VALUES ($1, $2, $3) \
             RETURNING id, created_at, updated_at",
        )
        .bind(author_id)
        .bind((!text.is_empty()).then(|| text.to_string()))
        .bind((!image.is_empty()).then(|| image.to_string()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!("Error inserting post with author {author_id} : {e}");
            AppError::internal_server_error()
        })?;

        Ok(PublicPost {
            id: inserted.id,
            author,
            text: (!text.is_empty()).then(|| text.to_string()),
            image: (!image.is_empty()).then(|| image.to_string()),
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: inserted.created_at,
            updated_at: inserted.updated_at,
        })
    }

    /// Adds a like on the post if the account has none, removes it
    /// otherwise, and returns the updated post.
    pub async fn toggle_like(&self, post_id: i64, account_id: i64) -> Result<PublicPost, AppError> {
        let account = self.find_account(account_id).await?.ok_or_else(|| {
            warn!("Unknown account {account_id} tried to like post {post_id}");
            AppError::not_found_error("Compte introuvable.")
        })?;

        self.with_one_retry("toggling a like", post_id, || {
            self.try_toggle_like(post_id, &account)
        })
        .await
    }

    /// Appends a comment to the post and returns the updated post.
    /// Existing comments are never touched.
    pub async fn add_comment(
        &self,
        post_id: i64,
        account_id: i64,
        text: &str,
    ) -> Result<PublicPost, AppError> {
        let text = text.trim();
        check_comment_text(account_id, text)?;

        let account = self.find_account(account_id).await?.ok_or_else(|| {
            warn!("Unknown account {account_id} tried to comment post {post_id}");
            AppError::not_found_error("Compte introuvable.")
        })?;

        self.with_one_retry("adding a comment", post_id, || {
            self.try_add_comment(post_id, &account, text)
        })
        .await
    }

    async fn try_toggle_like(
        &self,
        post_id: i64,
        account: &PublicAccount,
    ) -> Result<PublicPost, MutationError> {
        let mut tx = self.pool.begin().await?;

        let mut post = fetch_post_for_update(&mut tx, post_id)
            .await?
            .ok_or_else(|| {
                warn!(
                    "Account {} tried to like the non-existing post {post_id}",
                    account.id
                );
                MutationError::App(AppError::not_found_error("Post introuvable."))
            })?;

        post.toggle_like(account);
        let updated_at = store_interactions(&mut tx, &post).await?;
        post.updated_at = updated_at;

        tx.commit().await.map_err(MutationError::Commit)?;
        Ok(post)
    }

    async fn try_add_comment(
        &self,
        post_id: i64,
        account: &PublicAccount,
        text: &str,
    ) -> Result<PublicPost, MutationError> {
        let mut tx = self.pool.begin().await?;

        let mut post = fetch_post_for_update(&mut tx, post_id)
            .await?
            .ok_or_else(|| {
                warn!(
                    "Account {} tried to comment the non-existing post {post_id}",
                    account.id
                );
                MutationError::App(AppError::not_found_error("Post introuvable."))
            })?;

        post.add_comment(account, text.to_string(), OffsetDateTime::now_utc());
        let updated_at = store_interactions(&mut tx, &post).await?;
        post.updated_at = updated_at;

        tx.commit().await.map_err(MutationError::Commit)?;
        Ok(post)
    }

    /// Runs a mutation attempt, retrying it once when the storage layer
    /// fails transiently. Validation and not-found outcomes are final and
    /// never retried.
    async fn with_one_retry<F, Fut>(
        &self,
        action: &str,
        post_id: i64,
        attempt: F,
    ) -> Result<PublicPost, AppError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<PublicPost, MutationError>>,
    {
        match attempt().await {
            Ok(post) => Ok(post),
            Err(error) if error.can_retry() => {
                if let MutationError::Storage(e) | MutationError::Commit(e) = &error {
                    warn!("Transient storage error while {action} on post {post_id}, retrying once : {e}");
                }
                attempt()
                    .await
                    .map_err(|retry_error| surface_error(retry_error, action, post_id))
            }
            Err(error) => Err(surface_error(error, action, post_id)),
        }
    }
}

async fn fetch_post_for_update(
    tx: &mut Transaction<'_, Postgres>,
    post_id: i64,
) -> Result<Option<PublicPost>, sqlx::Error> {
    let query = format!(
        "SELECT {POST_COLUMNS} FROM posts p JOIN users u ON u.id = p.author_id \
         WHERE p.id = $1 FOR UPDATE OF p"
    );

    let record = sqlx::query_as::<_, PostRecord>(&query)
        .bind(post_id)
        .fetch_optional(&mut **tx)
        .await?;

    Ok(record.map(PublicPost::from))
}

async fn store_interactions(
    tx: &mut Transaction<'_, Postgres>,
    post: &PublicPost,
) -> Result<OffsetDateTime, sqlx::Error> {
    #[derive(FromRow)]
    struct UpdatedAt {
        updated_at: OffsetDateTime,
    }

    let updated = sqlx::query_as::<_, UpdatedAt>(
        "UPDATE posts SET likes = $1, comments = $2, updated_at = now() \
         WHERE id = $3 RETURNING updated_at",
    )
    .bind(Json(&post.likes))
    .bind(Json(&post.comments))
    .bind(post.id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(updated.updated_at)
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[derive(Debug)]
    struct PgStateError(&'static str);

    impl fmt::Display for PgStateError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "sqlstate {}", self.0)
        }
    }

    impl StdError for PgStateError {}

    impl DatabaseError for PgStateError {
        fn message(&self) -> &str {
            "storage failure"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.0))
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }
    }

    fn io_error() -> sqlx::Error {
        sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset",
        ))
    }

    fn sqlstate(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(PgStateError(code)))
    }

    #[test]
    fn connection_failures_before_commit_are_retried() {
        assert!(MutationError::Storage(io_error()).can_retry());
        assert!(MutationError::Storage(sqlx::Error::PoolTimedOut).can_retry());
        assert!(MutationError::Storage(sqlstate("40001")).can_retry());
    }

    #[test]
    fn an_ambiguous_commit_failure_is_not_retried() {
        // the commit may have landed ; re-running would flip a toggle back
        assert!(!MutationError::Commit(io_error()).can_retry());
    }

    #[test]
    fn a_serialization_rollback_at_commit_is_retried() {
        assert!(MutationError::Commit(sqlstate("40001")).can_retry());
        assert!(MutationError::Commit(sqlstate("40P01")).can_retry());
    }

    #[test]
    fn final_outcomes_are_never_retried() {
        let not_found = AppError::not_found_error("Post introuvable.");
        assert!(!MutationError::App(not_found).can_retry());
        // a unique violation is not transient
        assert!(!MutationError::Storage(sqlstate("23505")).can_retry());
    }
}
