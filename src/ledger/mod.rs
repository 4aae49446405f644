//! Submission, award, and role-request ledger
//!
//! The state machine at the heart of Greenway: proof submissions move
//! pending → approved | rejected through a one-shot review, approvals pay
//! points and badges at most once, and role elevation runs through an
//! admin-gated request of its own. All transitions go through the
//! [`LedgerStore`] seam so the same engine runs over MongoDB in production
//! and the in-memory store in dev mode and tests.

pub mod awards;
pub mod eligibility;
pub mod memory;
pub mod mongo;
pub mod roles;
pub mod store;
pub mod submissions;

pub use memory::MemoryStore;
pub use mongo::MongoLedgerStore;
pub use store::LedgerStore;

use std::sync::Arc;
use tracing::warn;

use crate::db::schemas::{AccountDoc, NotificationKind, TargetDoc, TargetKind};
use crate::notify::Notifier;
use crate::types::{GreenwayError, Result};

/// Ledger engine: store seam plus the notification sink for terminal
/// transitions
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    notifier: Arc<dyn Notifier>,
}

impl Ledger {
    pub fn new(store: Arc<dyn LedgerStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Fetch the account, provisioning it on first sight
    pub async fn ensure_account(&self, account_id: &str, display_name: &str) -> Result<AccountDoc> {
        self.store.ensure_account(account_id, display_name).await
    }

    pub async fn account(&self, account_id: &str) -> Result<Option<AccountDoc>> {
        self.store.account(account_id).await
    }

    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<AccountDoc>> {
        self.store.leaderboard(limit).await
    }

    /// Add a quest or challenge to the catalog
    pub async fn create_target(
        &self,
        created_by: &str,
        kind: TargetKind,
        title: &str,
        description: &str,
        points: i64,
    ) -> Result<TargetDoc> {
        if title.trim().is_empty() {
            return Err(GreenwayError::Validation("Title is required".into()));
        }
        if points <= 0 {
            return Err(GreenwayError::Validation(
                "Points must be greater than zero".into(),
            ));
        }

        let target = TargetDoc::new(
            kind,
            title.trim().to_string(),
            description.trim().to_string(),
            points,
            created_by.to_string(),
        );
        self.store.insert_target(target).await
    }

    pub async fn target(&self, id: &str) -> Result<Option<TargetDoc>> {
        self.store.target_by_id(id).await
    }

    pub async fn list_targets(&self) -> Result<Vec<TargetDoc>> {
        self.store.list_targets().await
    }

    /// Deliver a notification without letting a delivery failure fail the
    /// transition that produced it
    async fn notify_quietly(&self, account_id: &str, kind: NotificationKind, message: &str) {
        if let Err(e) = self.notifier.notify(account_id, kind, message).await {
            warn!(account_id = %account_id, kind = %kind, "Notification delivery failed: {}", e);
        }
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::notify::MemoryNotifier;

    /// Ledger over the in-memory store, with the notifier exposed so tests
    /// can assert on deliveries
    pub fn test_ledger() -> (Ledger, Arc<MemoryNotifier>) {
        let notifier = Arc::new(MemoryNotifier::new());
        let ledger = Ledger::new(Arc::new(MemoryStore::new()), notifier.clone());
        (ledger, notifier)
    }
}
