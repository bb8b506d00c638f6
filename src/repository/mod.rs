pub mod feed;
pub mod post_repository;

use sqlx::prelude::FromRow;
use sqlx::types::Json;
use time::OffsetDateTime;

use crate::models::account::PublicAccount;
use crate::models::post::{Comment, Like, PublicPost};

/// Columns shared by every post query, with the author joined in so a
/// single fetch yields the fully resolved shape.
pub(crate) const POST_COLUMNS: &str = "p.id, p.author_id, u.username AS author_username, \
     p.text, p.image, p.likes, p.comments, p.created_at, p.updated_at";

#[derive(FromRow)]
pub(crate) struct PostRecord {
    id: i64,
    author_id: i64,
    author_username: String,
    text: Option<String>,
    image: Option<String>,
    likes: Json<Vec<Like>>,
    comments: Json<Vec<Comment>>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<PostRecord> for PublicPost {
    fn from(record: PostRecord) -> Self {
        PublicPost {
            id: record.id,
            author: PublicAccount {
                id: record.author_id,
                username: record.author_username,
            },
            text: record.text,
            image: record.image,
            likes: record.likes.0,
            comments: record.comments.0,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
