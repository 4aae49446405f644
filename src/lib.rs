//! Greenway - campus sustainability engagement backend
//!
//! Students complete quests and challenges by submitting photo proof,
//! partners and admins review the proof, approvals award points and badges,
//! and an admin-gated request flow elevates accounts to partner or admin.
//!
//! ## Services
//!
//! - **Ledger**: submission lifecycle, award engine, role-request state machine
//! - **Catalog**: quest/challenge target definitions
//! - **Feed**: community posts, likes, comments
//! - **Notifications**: persisted terminal-transition events per account
//! - **Media**: disk-backed object store for proof photos

pub mod auth;
pub mod config;
pub mod db;
pub mod feed;
pub mod ledger;
pub mod notify;
pub mod objstore;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{GreenwayError, Result};
