//! Target document schema
//!
//! A target is a quest or challenge definition: the catalog entry that
//! submissions are made against and that fixes the point value paid on
//! approval.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::{Metadata, TargetKind};

/// Collection name for targets
pub const TARGET_COLLECTION: &str = "targets";

/// Quest or challenge definition stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TargetDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Quest or challenge
    pub kind: TargetKind,

    /// Short title shown in the catalog
    pub title: String,

    /// Longer description of what to do and what proof to attach
    pub description: String,

    /// Points paid on approval; fixed at creation
    pub points: i64,

    /// Account that created this target
    pub created_by: String,

    /// Inactive targets stay visible on past submissions but accept no new ones
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl TargetDoc {
    pub fn new(
        kind: TargetKind,
        title: String,
        description: String,
        points: i64,
        created_by: String,
    ) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            kind,
            title,
            description,
            points,
            created_by,
            is_active: true,
        }
    }
}

impl IntoIndexes for TargetDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "kind": 1, "is_active": 1 },
            Some(
                IndexOptions::builder()
                    .name("kind_active_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for TargetDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
