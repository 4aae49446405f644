//! Notification document schema
//!
//! One document per event delivered to an account's inbox. Written
//! fire-and-forget after ledger transitions commit.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for notifications
pub const NOTIFICATION_COLLECTION: &str = "notifications";

/// What kind of event a notification describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[default]
    SubmissionApproved,
    SubmissionRejected,
    RoleApproved,
    RoleRejected,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::SubmissionApproved => write!(f, "submission_approved"),
            NotificationKind::SubmissionRejected => write!(f, "submission_rejected"),
            NotificationKind::RoleApproved => write!(f, "role_approved"),
            NotificationKind::RoleRejected => write!(f, "role_rejected"),
        }
    }
}

/// Notification document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct NotificationDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Recipient account
    pub account_id: String,

    /// Event kind
    pub kind: NotificationKind,

    /// Human-readable message
    pub message: String,

    /// Whether the recipient has marked this read
    #[serde(default)]
    pub read: bool,
}

impl NotificationDoc {
    pub fn new(account_id: String, kind: NotificationKind, message: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            account_id,
            kind,
            message,
            read: false,
        }
    }
}

impl IntoIndexes for NotificationDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "account_id": 1 },
            Some(
                IndexOptions::builder()
                    .name("account_id_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for NotificationDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
