//! Community feed
//!
//! Posts with likes and comments, stored one document per post so like
//! toggles and comment appends are single-document updates. Separate from
//! the ledger: nothing here affects points or roles.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime};
use std::str::FromStr;
use std::sync::Mutex;

use crate::db::schemas::{Comment, PostDoc, POST_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{GreenwayError, Result};

#[async_trait]
pub trait FeedStore: Send + Sync {
    async fn create_post(&self, post: PostDoc) -> Result<PostDoc>;

    /// All posts, newest first
    async fn list_posts(&self) -> Result<Vec<PostDoc>>;

    /// Add or remove the account's like; `None` when the post is missing
    async fn toggle_like(&self, post_id: &str, account_id: &str) -> Result<Option<PostDoc>>;

    /// Append a comment; `None` when the post is missing
    async fn add_comment(&self, post_id: &str, comment: Comment) -> Result<Option<PostDoc>>;
}

/// MongoDB-backed feed
pub struct MongoFeed {
    posts: MongoCollection<PostDoc>,
}

impl MongoFeed {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            posts: client.collection(POST_COLLECTION).await?,
        })
    }
}

#[async_trait]
impl FeedStore for MongoFeed {
    async fn create_post(&self, post: PostDoc) -> Result<PostDoc> {
        let mut post = post;
        let id = self.posts.insert_one(post.clone()).await?;
        post._id = Some(id);
        Ok(post)
    }

    async fn list_posts(&self) -> Result<Vec<PostDoc>> {
        let mut items = self.posts.find_many(doc! {}).await?;
        items.sort_by(|a, b| b.metadata.created_at.cmp(&a.metadata.created_at));
        Ok(items)
    }

    async fn toggle_like(&self, post_id: &str, account_id: &str) -> Result<Option<PostDoc>> {
        let Some(oid) = ObjectId::from_str(post_id).ok() else {
            return Ok(None);
        };

        // Like when not yet a member, otherwise unlike. Each arm's filter
        // carries the membership precondition, so racing toggles cannot
        // double-apply.
        if let Some(post) = self
            .posts
            .find_one_and_update(
                doc! { "_id": oid, "likes": { "$ne": account_id } },
                doc! { "$addToSet": { "likes": account_id } },
            )
            .await?
        {
            return Ok(Some(post));
        }

        if let Some(post) = self
            .posts
            .find_one_and_update(
                doc! { "_id": oid, "likes": account_id },
                doc! { "$pull": { "likes": account_id } },
            )
            .await?
        {
            return Ok(Some(post));
        }

        self.posts.find_one(doc! { "_id": oid }).await
    }

    async fn add_comment(&self, post_id: &str, comment: Comment) -> Result<Option<PostDoc>> {
        let Some(oid) = ObjectId::from_str(post_id).ok() else {
            return Ok(None);
        };

        let comment_bson = bson::to_bson(&comment)
            .map_err(|e| GreenwayError::Internal(format!("Comment encoding failed: {}", e)))?;

        self.posts
            .find_one_and_update(
                doc! { "_id": oid },
                doc! {
                    "$push": { "comments": comment_bson },
                    "$set": { "metadata.updated_at": DateTime::now() },
                },
            )
            .await
    }
}

/// In-memory feed for dev mode and tests
#[derive(Default)]
pub struct MemoryFeed {
    posts: Mutex<Vec<PostDoc>>,
}

impl MemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedStore for MemoryFeed {
    async fn create_post(&self, post: PostDoc) -> Result<PostDoc> {
        let mut post = post;
        post._id = Some(ObjectId::new());
        self.posts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(post.clone());
        Ok(post)
    }

    async fn list_posts(&self) -> Result<Vec<PostDoc>> {
        let mut items = self
            .posts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        items.reverse();
        Ok(items)
    }

    async fn toggle_like(&self, post_id: &str, account_id: &str) -> Result<Option<PostDoc>> {
        let Some(oid) = ObjectId::from_str(post_id).ok() else {
            return Ok(None);
        };

        let mut posts = self.posts.lock().unwrap_or_else(|e| e.into_inner());
        for post in posts.iter_mut() {
            if post._id == Some(oid) {
                if let Some(idx) = post.likes.iter().position(|a| a == account_id) {
                    post.likes.remove(idx);
                } else {
                    post.likes.push(account_id.to_string());
                }
                return Ok(Some(post.clone()));
            }
        }
        Ok(None)
    }

    async fn add_comment(&self, post_id: &str, comment: Comment) -> Result<Option<PostDoc>> {
        let Some(oid) = ObjectId::from_str(post_id).ok() else {
            return Ok(None);
        };

        let mut posts = self.posts.lock().unwrap_or_else(|e| e.into_inner());
        for post in posts.iter_mut() {
            if post._id == Some(oid) {
                post.comments.push(comment);
                return Ok(Some(post.clone()));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> PostDoc {
        PostDoc::new(
            "acct-1".into(),
            "Sam".into(),
            "Cleaned up the quad today".into(),
            None,
        )
    }

    #[tokio::test]
    async fn like_toggles_on_and_off() {
        let feed = MemoryFeed::new();
        let created = feed.create_post(post()).await.unwrap();
        let id = created._id.unwrap().to_hex();

        let liked = feed.toggle_like(&id, "acct-2").await.unwrap().unwrap();
        assert_eq!(liked.likes, vec!["acct-2"]);

        let unliked = feed.toggle_like(&id, "acct-2").await.unwrap().unwrap();
        assert!(unliked.likes.is_empty());
    }

    #[tokio::test]
    async fn comments_append_in_order() {
        let feed = MemoryFeed::new();
        let created = feed.create_post(post()).await.unwrap();
        let id = created._id.unwrap().to_hex();

        for text in ["nice!", "well done"] {
            feed.add_comment(
                &id,
                Comment {
                    author_id: "acct-2".into(),
                    author_name: "Kim".into(),
                    text: text.into(),
                    created_at: DateTime::now(),
                },
            )
            .await
            .unwrap();
        }

        let posts = feed.list_posts().await.unwrap();
        assert_eq!(posts[0].comments.len(), 2);
        assert_eq!(posts[0].comments[0].text, "nice!");
    }

    #[tokio::test]
    async fn missing_post_is_none() {
        let feed = MemoryFeed::new();
        let res = feed
            .toggle_like("ffffffffffffffffffffffff", "acct-1")
            .await
            .unwrap();
        assert!(res.is_none());
    }
}
