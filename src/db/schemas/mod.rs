//! Database schemas for Greenway
//!
//! Defines MongoDB document structures for accounts, submissions, targets,
//! notifications, and feed posts.

mod account;
mod metadata;
mod notification;
mod post;
mod submission;
mod target;

pub use account::{AccountDoc, ACCOUNT_COLLECTION};
pub use metadata::Metadata;
pub use notification::{NotificationDoc, NotificationKind, NOTIFICATION_COLLECTION};
pub use post::{Comment, PostDoc, POST_COLLECTION};
pub use submission::{
    ReviewDecision, SubmissionDoc, SubmissionStatus, TargetKind, SUBMISSION_COLLECTION,
};
pub use target::{TargetDoc, TARGET_COLLECTION};
