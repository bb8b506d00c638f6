use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::account::PublicAccount;

/// One like entry. The username is a snapshot taken when the like was
/// given : renaming the account later does not rewrite it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub account_id: i64,
    pub username: String,
}

/// One comment entry. Same username-snapshot rule as [`Like`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub account_id: i64,
    pub username: String,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A post with its author resolved and its likes/comments embedded, as
/// returned by every route. Mutation routes and feed reads produce the
/// exact same shape.
#[derive(Serialize)]
pub struct PublicPost {
    pub id: i64,
    pub author: PublicAccount,
    pub text: Option<String>,
    pub image: Option<String>,
    pub likes: Vec<Like>,
    pub comments: Vec<Comment>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl PublicPost {
    /// Adds a like if the account has none on this post, removes it
    /// otherwise. Returns `true` when the post ends up liked. An account
    /// never appears twice in `likes`, and a re-like lands at the end of
    /// the sequence.
    pub fn toggle_like(&mut self, account: &PublicAccount) -> bool {
        match self
            .likes
            .iter()
            .position(|like| like.account_id == account.id)
        {
            Some(index) => {
                self.likes.remove(index);
                false
            }
            None => {
                self.likes.push(Like {
                    account_id: account.id,
                    username: account.username.clone(),
                });
                true
            }
        }
    }

    /// Appends a comment. Existing entries are never edited or removed.
    pub fn add_comment(&mut self, account: &PublicAccount, text: String, created_at: OffsetDateTime) {
        self.comments.push(Comment {
            account_id: account.id,
            username: account.username.clone(),
            text,
            created_at,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: i64, username: &str) -> PublicAccount {
        PublicAccount {
            id,
            username: username.to_string(),
        }
    }

    fn post(author: &PublicAccount) -> PublicPost {
        let now = OffsetDateTime::now_utc();
        PublicPost {
            id: 1,
            author: author.clone(),
            text: Some("hi".to_string()),
            image: None,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn toggling_twice_restores_the_likes() {
        let author = account(1, "author");
        let liker = account(2, "liker");
        let mut post = post(&author);

        assert!(post.toggle_like(&liker));
        assert_eq!(post.likes.len(), 1);
        assert_eq!(post.likes[0].account_id, 2);
        assert_eq!(post.likes[0].username, "liker");

        assert!(!post.toggle_like(&liker));
        assert!(post.likes.is_empty());
    }

    #[test]
    fn an_account_never_appears_twice_in_likes() {
        let author = account(1, "author");
        let first = account(2, "first");
        let second = account(3, "second");
        let mut post = post(&author);

        for _ in 0..3 {
            post.toggle_like(&first);
        }
        post.toggle_like(&second);

        let mut accounts: Vec<i64> = post.likes.iter().map(|like| like.account_id).collect();
        accounts.sort_unstable();
        assert_eq!(accounts, vec![2, 3]);
    }

    #[test]
    fn a_re_like_moves_the_entry_to_the_end() {
        let author = account(1, "author");
        let first = account(2, "first");
        let second = account(3, "second");
        let mut post = post(&author);

        post.toggle_like(&first);
        post.toggle_like(&second);
        // first unlikes then likes again
        post.toggle_like(&first);
        post.toggle_like(&first);

        let accounts: Vec<i64> = post.likes.iter().map(|like| like.account_id).collect();
        assert_eq!(accounts, vec![3, 2]);
    }

    #[test]
    fn comments_only_ever_grow() {
        let author = account(1, "author");
        let commenter = account(2, "commenter");
        let mut post = post(&author);

        for i in 0..5 {
            let before = post.comments.clone();
            post.add_comment(
                &commenter,
                format!("comment {i}"),
                OffsetDateTime::now_utc(),
            );
            assert_eq!(post.comments.len(), i + 1);
            // every previous entry is untouched, in place
            assert_eq!(&post.comments[..i], &before[..]);
        }
    }

    #[test]
    fn usernames_are_snapshots_of_the_action_time() {
        let author = account(1, "author");
        let mut commenter = account(2, "old_name");
        let mut post = post(&author);

        post.add_comment(&commenter, "first".to_string(), OffsetDateTime::now_utc());

        commenter.username = "new_name".to_string();
        post.toggle_like(&commenter);
        post.add_comment(&commenter, "second".to_string(), OffsetDateTime::now_utc());

        assert_eq!(post.comments[0].username, "old_name");
        assert_eq!(post.comments[1].username, "new_name");
        assert_eq!(post.likes[0].username, "new_name");
    }
}
