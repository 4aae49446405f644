//! In-memory ledger store
//!
//! Backs dev mode and the test suite. A single mutex around all tables gives
//! every trait method the same atomicity the MongoDB store gets from
//! single-document conditional updates.

use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use crate::auth::RequestedRole;
use crate::db::schemas::{AccountDoc, ReviewDecision, SubmissionDoc, SubmissionStatus, TargetDoc};
use crate::ledger::store::LedgerStore;
use crate::types::{GreenwayError, Result};

#[derive(Default)]
struct Tables {
    submissions: HashMap<String, SubmissionDoc>,
    accounts: HashMap<String, AccountDoc>,
    targets: HashMap<String, TargetDoc>,
}

/// Mutex-guarded in-memory store
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn insert_submission(&self, mut submission: SubmissionDoc) -> Result<SubmissionDoc> {
        let mut tables = self.lock();

        // Same check the partial unique index performs in MongoDB
        let live_exists = tables.submissions.values().any(|s| {
            s.principal_id == submission.principal_id
                && s.target_id == submission.target_id
                && s.is_live()
        });
        if live_exists {
            return Err(GreenwayError::DuplicateSubmission);
        }

        let id = ObjectId::new();
        submission._id = Some(id);
        tables.submissions.insert(id.to_hex(), submission.clone());
        Ok(submission)
    }

    async fn submission_by_id(&self, id: &str) -> Result<Option<SubmissionDoc>> {
        Ok(self.lock().submissions.get(id).cloned())
    }

    async fn submissions_for_pair(
        &self,
        principal_id: &str,
        target_id: &str,
    ) -> Result<Vec<SubmissionDoc>> {
        Ok(self
            .lock()
            .submissions
            .values()
            .filter(|s| s.principal_id == principal_id && s.target_id == target_id)
            .cloned()
            .collect())
    }

    async fn submissions_by_principal(&self, principal_id: &str) -> Result<Vec<SubmissionDoc>> {
        let mut items: Vec<SubmissionDoc> = self
            .lock()
            .submissions
            .values()
            .filter(|s| s.principal_id == principal_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(items)
    }

    async fn pending_submissions(&self) -> Result<Vec<SubmissionDoc>> {
        let mut items: Vec<SubmissionDoc> = self
            .lock()
            .submissions
            .values()
            .filter(|s| s.status == SubmissionStatus::Pending)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(items)
    }

    async fn claim_review(
        &self,
        id: &str,
        reviewer_id: &str,
        decision: ReviewDecision,
        rejection_reason: Option<String>,
    ) -> Result<Option<SubmissionDoc>> {
        let mut tables = self.lock();

        let Some(sub) = tables.submissions.get_mut(id) else {
            return Ok(None);
        };
        if sub.status != SubmissionStatus::Pending {
            return Ok(None);
        }

        sub.status = match decision {
            ReviewDecision::Approved => SubmissionStatus::Approved,
            ReviewDecision::Rejected => SubmissionStatus::Rejected,
        };
        sub.reviewer_id = Some(reviewer_id.to_string());
        sub.reviewed_at = Some(DateTime::now());
        sub.rejection_reason = rejection_reason;
        sub.metadata.updated_at = Some(DateTime::now());

        Ok(Some(sub.clone()))
    }

    async fn reopen_submission(&self, id: &str) -> Result<()> {
        let mut tables = self.lock();

        if let Some(sub) = tables.submissions.get_mut(id) {
            if sub.status == SubmissionStatus::Approved {
                sub.status = SubmissionStatus::Pending;
                sub.reviewer_id = None;
                sub.reviewed_at = None;
                sub.metadata.updated_at = Some(DateTime::now());
            }
        }
        Ok(())
    }

    async fn ensure_account(&self, account_id: &str, display_name: &str) -> Result<AccountDoc> {
        let mut tables = self.lock();

        let account = tables
            .accounts
            .entry(account_id.to_string())
            .or_insert_with(|| {
                let mut doc =
                    AccountDoc::new(account_id.to_string(), display_name.to_string());
                doc._id = Some(ObjectId::new());
                doc
            });
        Ok(account.clone())
    }

    async fn account(&self, account_id: &str) -> Result<Option<AccountDoc>> {
        Ok(self.lock().accounts.get(account_id).cloned())
    }

    async fn apply_award(
        &self,
        account_id: &str,
        target_id: &str,
        points: i64,
    ) -> Result<Option<i64>> {
        let mut tables = self.lock();

        let Some(account) = tables.accounts.get_mut(account_id) else {
            return Ok(None);
        };
        if account.completed_targets.iter().any(|t| t == target_id) {
            return Ok(None);
        }

        account.completed_targets.push(target_id.to_string());
        account.points += points;
        account.metadata.updated_at = Some(DateTime::now());
        Ok(Some(account.points))
    }

    async fn grant_badges(&self, account_id: &str, badges: &[String]) -> Result<()> {
        let mut tables = self.lock();

        if let Some(account) = tables.accounts.get_mut(account_id) {
            for badge in badges {
                if !account.badges.contains(badge) {
                    account.badges.push(badge.clone());
                }
            }
        }
        Ok(())
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<AccountDoc>> {
        let mut items: Vec<AccountDoc> = self.lock().accounts.values().cloned().collect();
        items.sort_by(|a, b| b.points.cmp(&a.points));
        items.truncate(limit);
        Ok(items)
    }

    async fn open_role_request(
        &self,
        account_id: &str,
        requested: RequestedRole,
    ) -> Result<Option<AccountDoc>> {
        let mut tables = self.lock();

        let Some(account) = tables.accounts.get_mut(account_id) else {
            return Ok(None);
        };
        if account.requested_role.is_some() {
            return Ok(None);
        }

        account.requested_role = Some(requested);
        account.role_request_approved = false;
        account.metadata.updated_at = Some(DateTime::now());
        Ok(Some(account.clone()))
    }

    async fn resolve_role_request(
        &self,
        account_id: &str,
        requested: RequestedRole,
        approve: bool,
    ) -> Result<Option<AccountDoc>> {
        let mut tables = self.lock();

        let Some(account) = tables.accounts.get_mut(account_id) else {
            return Ok(None);
        };
        if account.requested_role != Some(requested) {
            return Ok(None);
        }

        account.requested_role = None;
        if approve {
            account.role = requested.granted_role();
            account.role_request_approved = true;
        } else {
            account.role_request_approved = false;
        }
        account.metadata.updated_at = Some(DateTime::now());
        Ok(Some(account.clone()))
    }

    async fn pending_role_requests(&self) -> Result<Vec<AccountDoc>> {
        Ok(self
            .lock()
            .accounts
            .values()
            .filter(|a| a.requested_role.is_some())
            .cloned()
            .collect())
    }

    async fn insert_target(&self, mut target: TargetDoc) -> Result<TargetDoc> {
        let mut tables = self.lock();

        let id = ObjectId::new();
        target._id = Some(id);
        tables.targets.insert(id.to_hex(), target.clone());
        Ok(target)
    }

    async fn target_by_id(&self, id: &str) -> Result<Option<TargetDoc>> {
        // Reject malformed ids the same way the MongoDB store does
        if ObjectId::from_str(id).is_err() {
            return Ok(None);
        }
        Ok(self.lock().targets.get(id).cloned())
    }

    async fn list_targets(&self) -> Result<Vec<TargetDoc>> {
        let mut items: Vec<TargetDoc> = self.lock().targets.values().cloned().collect();
        items.sort_by(|a, b| a.metadata.created_at.cmp(&b.metadata.created_at));
        Ok(items)
    }
}
