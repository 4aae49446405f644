//! Submission document schema
//!
//! One document per quest-or-challenge attempt by one principal. The status
//! field is only ever mutated by the one-shot review transition; everything
//! else is immutable after creation.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for submissions
pub const SUBMISSION_COLLECTION: &str = "submissions";

/// What kind of target a submission is made against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    #[default]
    Quest,
    Challenge,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Quest => write!(f, "quest"),
            TargetKind::Challenge => write!(f, "challenge"),
        }
    }
}

/// Submission lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    /// Serialized form, for building bson filters
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reviewer's decision on a pending submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewDecision::Approved => write!(f, "approved"),
            ReviewDecision::Rejected => write!(f, "rejected"),
        }
    }
}

/// Submission document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SubmissionDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// The quest or challenge this submission is made against (hex ObjectId)
    pub target_id: String,

    /// Whether the target is a quest or a challenge
    pub target_kind: TargetKind,

    /// Account that submitted the proof
    pub principal_id: String,

    /// Free-form reflection text; required at creation
    pub reflection_text: String,

    /// URL of the stored proof photo; required at creation
    pub proof_url: String,

    /// Lifecycle state; mutable only by the review transition
    pub status: SubmissionStatus,

    /// Present only when status = rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,

    /// Account that issued the decision; present only after review
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_id: Option<String>,

    /// When the submission was created
    pub submitted_at: DateTime,

    /// Set exactly once on the first transition out of pending
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime>,
}

impl Default for SubmissionDoc {
    fn default() -> Self {
        Self {
            _id: None,
            metadata: Metadata::default(),
            target_id: String::new(),
            target_kind: TargetKind::default(),
            principal_id: String::new(),
            reflection_text: String::new(),
            proof_url: String::new(),
            status: SubmissionStatus::default(),
            rejection_reason: None,
            reviewer_id: None,
            submitted_at: DateTime::from_millis(0),
            reviewed_at: None,
        }
    }
}

impl SubmissionDoc {
    /// Create a new pending submission
    pub fn new(
        principal_id: String,
        target_id: String,
        target_kind: TargetKind,
        reflection_text: String,
        proof_url: String,
    ) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            target_id,
            target_kind,
            principal_id,
            reflection_text,
            proof_url,
            status: SubmissionStatus::Pending,
            rejection_reason: None,
            reviewer_id: None,
            submitted_at: DateTime::now(),
            reviewed_at: None,
        }
    }

    /// Whether this submission still occupies the pair's live slot
    pub fn is_live(&self) -> bool {
        matches!(
            self.status,
            SubmissionStatus::Pending | SubmissionStatus::Approved
        )
    }
}

impl IntoIndexes for SubmissionDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // At most one pending-or-approved submission per (principal, target).
            // The partial filter leaves rejected rows out so resubmission after
            // rejection inserts cleanly.
            (
                doc! { "principal_id": 1, "target_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .partial_filter_expression(doc! {
                            "status": { "$in": ["pending", "approved"] }
                        })
                        .name("live_submission_unique".to_string())
                        .build(),
                ),
            ),
            // Principal's own submission listing
            (
                doc! { "principal_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("principal_id_index".to_string())
                        .build(),
                ),
            ),
            // Reviewer queue
            (
                doc! { "status": 1 },
                Some(
                    IndexOptions::builder()
                        .name("status_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for SubmissionDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
