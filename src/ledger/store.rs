//! Persistence seam for the ledger
//!
//! Every transition the ledger performs maps to one method here, and every
//! method is an atomic unit against the backing store: the precondition and
//! the write are indivisible from the perspective of concurrent callers. A
//! `None` return from a conditional transition means the precondition did not
//! hold at write time; the caller maps that to the right conflict error.

use async_trait::async_trait;

use crate::auth::RequestedRole;
use crate::db::schemas::{AccountDoc, ReviewDecision, SubmissionDoc, TargetDoc};
use crate::types::Result;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    // --- submissions ---

    /// Insert a new pending submission and return it with its id assigned.
    ///
    /// Fails with `DuplicateSubmission` when a live (pending or approved)
    /// submission already exists for the same (principal, target) pair; the
    /// engine refines that into `AlreadyCompleted` by re-reading the pair.
    async fn insert_submission(&self, submission: SubmissionDoc) -> Result<SubmissionDoc>;

    async fn submission_by_id(&self, id: &str) -> Result<Option<SubmissionDoc>>;

    /// Full submission history for one (principal, target) pair
    async fn submissions_for_pair(
        &self,
        principal_id: &str,
        target_id: &str,
    ) -> Result<Vec<SubmissionDoc>>;

    async fn submissions_by_principal(&self, principal_id: &str) -> Result<Vec<SubmissionDoc>>;

    /// Review queue, oldest first
    async fn pending_submissions(&self) -> Result<Vec<SubmissionDoc>>;

    /// One-shot review transition: update where status is still pending.
    ///
    /// Returns the submission after the transition, or `None` when it was
    /// not pending at write time (missing or already reviewed).
    async fn claim_review(
        &self,
        id: &str,
        reviewer_id: &str,
        decision: ReviewDecision,
        rejection_reason: Option<String>,
    ) -> Result<Option<SubmissionDoc>>;

    /// Compensating transition: return an approved submission to pending.
    ///
    /// Used when the award step fails after the review claim committed, so
    /// no approved-but-unpaid record survives.
    async fn reopen_submission(&self, id: &str) -> Result<()>;

    // --- accounts ---

    /// Fetch the account, provisioning it with defaults if absent
    async fn ensure_account(&self, account_id: &str, display_name: &str) -> Result<AccountDoc>;

    async fn account(&self, account_id: &str) -> Result<Option<AccountDoc>>;

    /// At-most-once award: add the target to `completed_targets` and add
    /// `points` in one conditional update. Returns the new point total when
    /// applied, `None` when the target was already completed (no mutation).
    async fn apply_award(
        &self,
        account_id: &str,
        target_id: &str,
        points: i64,
    ) -> Result<Option<i64>>;

    /// Idempotent set-union of badge names onto the account
    async fn grant_badges(&self, account_id: &str, badges: &[String]) -> Result<()>;

    /// Top accounts by points, descending
    async fn leaderboard(&self, limit: usize) -> Result<Vec<AccountDoc>>;

    // --- role requests ---

    /// Open a role request: update where no request is pending. Returns the
    /// account after the update, or `None` when one was already pending.
    async fn open_role_request(
        &self,
        account_id: &str,
        requested: RequestedRole,
    ) -> Result<Option<AccountDoc>>;

    /// Resolve a pending role request: update where `requested_role` still
    /// equals `requested`. On approve the account's role becomes the granted
    /// role; on reject it is left unchanged. Returns `None` when no matching
    /// request was pending at write time.
    async fn resolve_role_request(
        &self,
        account_id: &str,
        requested: RequestedRole,
        approve: bool,
    ) -> Result<Option<AccountDoc>>;

    /// Accounts with an unresolved role request
    async fn pending_role_requests(&self) -> Result<Vec<AccountDoc>>;

    // --- targets ---

    async fn insert_target(&self, target: TargetDoc) -> Result<TargetDoc>;

    async fn target_by_id(&self, id: &str) -> Result<Option<TargetDoc>>;

    async fn list_targets(&self) -> Result<Vec<TargetDoc>>;
}
