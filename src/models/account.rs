use serde::Serialize;
use sqlx::prelude::FromRow;

/// Public identity of an account, the only part of a user exposed inside
/// posts, likes and comments.
#[derive(Clone, Serialize, FromRow)]
pub struct PublicAccount {
    pub id: i64,
    pub username: String,
}
