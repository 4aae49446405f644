//! Community feed post schema
//!
//! Posts carry likes as a set of account IDs and comments embedded in the
//! document, so like/unlike and comment are single-document updates.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for feed posts
pub const POST_COLLECTION: &str = "posts";

/// A comment embedded in a post
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Comment {
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime,
}

/// Feed post document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PostDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Account that wrote the post
    pub author_id: String,

    /// Display name at time of posting
    pub author_name: String,

    /// Post body
    pub text: String,

    /// Optional attached photo URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,

    /// Account IDs that have liked this post; $addToSet keeps it a set
    #[serde(default)]
    pub likes: Vec<String>,

    /// Comments in insertion order
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl PostDoc {
    pub fn new(
        author_id: String,
        author_name: String,
        text: String,
        photo_url: Option<String>,
    ) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            author_id,
            author_name,
            text,
            photo_url,
            likes: Vec::new(),
            comments: Vec::new(),
        }
    }
}

impl IntoIndexes for PostDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "metadata.created_at": -1 },
            Some(
                IndexOptions::builder()
                    .name("created_at_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for PostDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
