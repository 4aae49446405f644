//! Account document schema
//!
//! Accounts are provisioned lazily on first authenticated request. The
//! document is the authority on role, points, completed targets, and any
//! open role request.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::auth::{RequestedRole, Role};
use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for accounts
pub const ACCOUNT_COLLECTION: &str = "accounts";

/// Account document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AccountDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Stable external identifier carried in the JWT subject
    pub account_id: String,

    /// Display name shown on the leaderboard and feed
    pub display_name: String,

    /// Current role; only the role request transitions change this
    #[serde(default)]
    pub role: Role,

    /// Lifetime point balance; only the award transition increments this
    #[serde(default)]
    pub points: i64,

    /// Target IDs this account has been paid for, at most once each
    #[serde(default)]
    pub completed_targets: Vec<String>,

    /// Badge names granted so far
    #[serde(default)]
    pub badges: Vec<String>,

    /// Open role request, if any; at most one at a time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_role: Option<RequestedRole>,

    /// Whether the most recent resolved request was approved
    #[serde(default)]
    pub role_request_approved: bool,
}

impl AccountDoc {
    /// Create a new account with the default role and zero points
    pub fn new(account_id: String, display_name: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            account_id,
            display_name,
            role: Role::User,
            points: 0,
            completed_targets: Vec::new(),
            badges: Vec::new(),
            requested_role: None,
            role_request_approved: false,
        }
    }
}

impl IntoIndexes for AccountDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "account_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("account_id_index".to_string())
                        .build(),
                ),
            ),
            // Leaderboard sort
            (
                doc! { "points": -1 },
                Some(
                    IndexOptions::builder()
                        .name("points_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for AccountDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
