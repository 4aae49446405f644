//! Database layer for Greenway
//!
//! Provides MongoDB storage for accounts, submissions, targets,
//! notifications, and feed posts.

pub mod mongo;
pub mod schemas;

pub use mongo::{IntoIndexes, MongoClient, MongoCollection, MutMetadata};
pub use schemas::{
    AccountDoc, Comment, Metadata, NotificationDoc, PostDoc, SubmissionDoc, TargetDoc,
};
