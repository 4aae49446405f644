//! Submission lifecycle
//!
//! Creation runs through the eligibility guard and the storage-level unique
//! index, so a pair never holds two live submissions even when two creates
//! race. Review is a one-shot conditional transition; on approval the award
//! is applied synchronously and a failed award reopens the submission so no
//! approved-but-unpaid record survives.

use tracing::{info, warn};

use crate::db::schemas::{
    NotificationKind, ReviewDecision, SubmissionDoc, SubmissionStatus,
};
use crate::ledger::{eligibility, Ledger};
use crate::types::{GreenwayError, Result};

impl Ledger {
    /// Create a pending submission for a (principal, target) pair.
    ///
    /// The principal's account is provisioned if this is their first action.
    pub async fn create_submission(
        &self,
        principal_id: &str,
        display_name: &str,
        target_id: &str,
        reflection_text: &str,
        proof_url: &str,
    ) -> Result<SubmissionDoc> {
        let reflection = reflection_text.trim();
        if reflection.is_empty() {
            return Err(GreenwayError::Validation(
                "Reflection text is required".into(),
            ));
        }
        let proof = proof_url.trim();
        if proof.is_empty() {
            return Err(GreenwayError::Validation("Proof photo is required".into()));
        }

        self.store.ensure_account(principal_id, display_name).await?;

        let target = self
            .store
            .target_by_id(target_id)
            .await?
            .ok_or_else(|| GreenwayError::NotFound("Target not found".into()))?;
        if !target.is_active {
            return Err(GreenwayError::Validation(
                "Target no longer accepts submissions".into(),
            ));
        }

        let history = self
            .store
            .submissions_for_pair(principal_id, target_id)
            .await?;
        eligibility::can_submit(&history)?;

        let submission = SubmissionDoc::new(
            principal_id.to_string(),
            target_id.to_string(),
            target.kind,
            reflection.to_string(),
            proof.to_string(),
        );

        match self.store.insert_submission(submission).await {
            Ok(created) => {
                info!(
                    principal_id = %principal_id,
                    target_id = %target_id,
                    kind = %target.kind,
                    "Submission created"
                );
                Ok(created)
            }
            // Guard passed but the insert lost an index race; re-read the
            // pair to report the precise reason
            Err(GreenwayError::DuplicateSubmission) => {
                let history = self
                    .store
                    .submissions_for_pair(principal_id, target_id)
                    .await?;
                if history
                    .iter()
                    .any(|s| s.status == SubmissionStatus::Approved)
                {
                    Err(GreenwayError::AlreadyCompleted)
                } else {
                    Err(GreenwayError::DuplicateSubmission)
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Review a pending submission. Exactly one of two racing reviews wins;
    /// the loser gets `AlreadyReviewed`.
    pub async fn review_submission(
        &self,
        reviewer_id: &str,
        submission_id: &str,
        decision: ReviewDecision,
        rejection_reason: Option<&str>,
    ) -> Result<SubmissionDoc> {
        let reason = match decision {
            ReviewDecision::Rejected => {
                let reason = rejection_reason.map(str::trim).unwrap_or("");
                if reason.is_empty() {
                    return Err(GreenwayError::Validation(
                        "A rejection reason is required".into(),
                    ));
                }
                Some(reason.to_string())
            }
            ReviewDecision::Approved => None,
        };

        let claimed = self
            .store
            .claim_review(submission_id, reviewer_id, decision, reason.clone())
            .await?;

        let submission = match claimed {
            Some(s) => s,
            None => {
                // Distinguish a missing submission from a lost review race
                return match self.store.submission_by_id(submission_id).await? {
                    None => Err(GreenwayError::NotFound("Submission not found".into())),
                    Some(_) => Err(GreenwayError::AlreadyReviewed),
                };
            }
        };

        match decision {
            ReviewDecision::Approved => {
                let target = match self.store.target_by_id(&submission.target_id).await? {
                    Some(t) => t,
                    None => {
                        self.store.reopen_submission(submission_id).await?;
                        return Err(GreenwayError::Internal(format!(
                            "Target {} missing for approved submission",
                            submission.target_id
                        )));
                    }
                };

                if let Err(e) = self
                    .award(&submission.principal_id, &submission.target_id, target.points)
                    .await
                {
                    // The award did not apply; undo the claim so the
                    // submission can be reviewed again
                    warn!(
                        submission_id = %submission_id,
                        "Award failed after review claim, reopening: {}",
                        e
                    );
                    self.store.reopen_submission(submission_id).await?;
                    return Err(e);
                }

                info!(
                    submission_id = %submission_id,
                    reviewer_id = %reviewer_id,
                    points = target.points,
                    "Submission approved"
                );
                self.notify_quietly(
                    &submission.principal_id,
                    NotificationKind::SubmissionApproved,
                    &format!("\"{}\" approved: +{} points", target.title, target.points),
                )
                .await;
            }
            ReviewDecision::Rejected => {
                info!(
                    submission_id = %submission_id,
                    reviewer_id = %reviewer_id,
                    "Submission rejected"
                );
                let message = match &reason {
                    Some(r) => format!("Submission rejected: {}", r),
                    None => "Submission rejected".to_string(),
                };
                self.notify_quietly(
                    &submission.principal_id,
                    NotificationKind::SubmissionRejected,
                    &message,
                )
                .await;
            }
        }

        Ok(submission)
    }

    pub async fn submission(&self, id: &str) -> Result<Option<SubmissionDoc>> {
        self.store.submission_by_id(id).await
    }

    /// The principal's own submissions, newest first
    pub async fn submissions_for(&self, principal_id: &str) -> Result<Vec<SubmissionDoc>> {
        self.store.submissions_by_principal(principal_id).await
    }

    /// Review queue, oldest first
    pub async fn review_queue(&self) -> Result<Vec<SubmissionDoc>> {
        self.store.pending_submissions().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::TargetKind;
    use crate::ledger::testutil::test_ledger;
    use crate::ledger::MemoryStore;
    use std::sync::Arc;

    async fn seed_target(ledger: &Ledger, points: i64) -> String {
        let target = ledger
            .create_target("partner-1", TargetKind::Quest, "Plant trees", "Plant 5 trees", points)
            .await
            .unwrap();
        target._id.unwrap().to_hex()
    }

    async fn submit(ledger: &Ledger, target_id: &str) -> Result<SubmissionDoc> {
        ledger
            .create_submission(
                "student-1",
                "Sam Student",
                target_id,
                "Planted 5 trees",
                "https://x/proof1.jpg",
            )
            .await
    }

    #[tokio::test]
    async fn create_requires_reflection_and_proof() {
        let (ledger, _) = test_ledger();
        let target_id = seed_target(&ledger, 50).await;

        let err = ledger
            .create_submission("student-1", "Sam", &target_id, "   ", "https://x/p.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, GreenwayError::Validation(_)));

        let err = ledger
            .create_submission("student-1", "Sam", &target_id, "did it", "")
            .await
            .unwrap_err();
        assert!(matches!(err, GreenwayError::Validation(_)));
    }

    #[tokio::test]
    async fn create_rejects_unknown_target() {
        let (ledger, _) = test_ledger();
        let err = submit(&ledger, "ffffffffffffffffffffffff").await.unwrap_err();
        assert!(matches!(err, GreenwayError::NotFound(_)));
    }

    #[tokio::test]
    async fn pending_submission_blocks_a_second_create() {
        let (ledger, _) = test_ledger();
        let target_id = seed_target(&ledger, 50).await;

        submit(&ledger, &target_id).await.unwrap();
        let err = submit(&ledger, &target_id).await.unwrap_err();
        assert!(matches!(err, GreenwayError::DuplicateSubmission));
    }

    #[tokio::test]
    async fn approval_forecloses_resubmission() {
        let (ledger, _) = test_ledger();
        let target_id = seed_target(&ledger, 50).await;

        let sub = submit(&ledger, &target_id).await.unwrap();
        ledger
            .review_submission(
                "partner-1",
                &sub._id.unwrap().to_hex(),
                ReviewDecision::Approved,
                None,
            )
            .await
            .unwrap();

        let err = submit(&ledger, &target_id).await.unwrap_err();
        assert!(matches!(err, GreenwayError::AlreadyCompleted));
    }

    #[tokio::test]
    async fn rejection_reopens_the_slot() {
        let (ledger, _) = test_ledger();
        let target_id = seed_target(&ledger, 50).await;

        let sub = submit(&ledger, &target_id).await.unwrap();
        ledger
            .review_submission(
                "partner-1",
                &sub._id.unwrap().to_hex(),
                ReviewDecision::Rejected,
                Some("Photo does not show the action"),
            )
            .await
            .unwrap();

        let again = submit(&ledger, &target_id).await.unwrap();
        assert_eq!(again.status, SubmissionStatus::Pending);
        assert_ne!(again._id, sub._id);
    }

    #[tokio::test]
    async fn review_is_one_shot() {
        let (ledger, _) = test_ledger();
        let target_id = seed_target(&ledger, 50).await;

        let sub = submit(&ledger, &target_id).await.unwrap();
        let id = sub._id.unwrap().to_hex();

        ledger
            .review_submission("partner-1", &id, ReviewDecision::Approved, None)
            .await
            .unwrap();

        let err = ledger
            .review_submission(
                "partner-2",
                &id,
                ReviewDecision::Rejected,
                Some("changed my mind"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GreenwayError::AlreadyReviewed));

        let after = ledger.submission(&id).await.unwrap().unwrap();
        assert_eq!(after.status, SubmissionStatus::Approved);
    }

    #[tokio::test]
    async fn rejection_without_reason_leaves_submission_pending() {
        let (ledger, _) = test_ledger();
        let target_id = seed_target(&ledger, 50).await;

        let sub = submit(&ledger, &target_id).await.unwrap();
        let id = sub._id.unwrap().to_hex();

        let err = ledger
            .review_submission("partner-1", &id, ReviewDecision::Rejected, Some("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, GreenwayError::Validation(_)));

        let after = ledger.submission(&id).await.unwrap().unwrap();
        assert_eq!(after.status, SubmissionStatus::Pending);
    }

    #[tokio::test]
    async fn review_of_unknown_submission_is_not_found() {
        let (ledger, _) = test_ledger();
        let err = ledger
            .review_submission(
                "partner-1",
                "ffffffffffffffffffffffff",
                ReviewDecision::Approved,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GreenwayError::NotFound(_)));
    }

    #[tokio::test]
    async fn racing_reviews_produce_one_winner() {
        let (ledger, _) = test_ledger();
        let ledger = Arc::new(ledger);
        let target_id = seed_target(&ledger, 50).await;

        let sub = submit(&ledger, &target_id).await.unwrap();
        let id = sub._id.unwrap().to_hex();

        let a = {
            let ledger = ledger.clone();
            let id = id.clone();
            tokio::spawn(async move {
                ledger
                    .review_submission("partner-1", &id, ReviewDecision::Approved, None)
                    .await
            })
        };
        let b = {
            let ledger = ledger.clone();
            let id = id.clone();
            tokio::spawn(async move {
                ledger
                    .review_submission("partner-2", &id, ReviewDecision::Approved, None)
                    .await
            })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(GreenwayError::AlreadyReviewed)))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(conflicts, 1);

        // Exactly one award landed
        let account = ledger.account("student-1").await.unwrap().unwrap();
        assert_eq!(account.points, 50);
    }

    /// Delegates to the in-memory store but refuses every award, standing in
    /// for a store whose account write fails mid-review.
    struct UnpaidAwardStore {
        inner: MemoryStore,
    }

    #[async_trait::async_trait]
    impl crate::ledger::LedgerStore for UnpaidAwardStore {
        async fn insert_submission(&self, submission: SubmissionDoc) -> Result<SubmissionDoc> {
            self.inner.insert_submission(submission).await
        }

        async fn submission_by_id(&self, id: &str) -> Result<Option<SubmissionDoc>> {
            self.inner.submission_by_id(id).await
        }

        async fn submissions_for_pair(
            &self,
            principal_id: &str,
            target_id: &str,
        ) -> Result<Vec<SubmissionDoc>> {
            self.inner.submissions_for_pair(principal_id, target_id).await
        }

        async fn submissions_by_principal(
            &self,
            principal_id: &str,
        ) -> Result<Vec<SubmissionDoc>> {
            self.inner.submissions_by_principal(principal_id).await
        }

        async fn pending_submissions(&self) -> Result<Vec<SubmissionDoc>> {
            self.inner.pending_submissions().await
        }

        async fn claim_review(
            &self,
            id: &str,
            reviewer_id: &str,
            decision: ReviewDecision,
            rejection_reason: Option<String>,
        ) -> Result<Option<SubmissionDoc>> {
            self.inner
                .claim_review(id, reviewer_id, decision, rejection_reason)
                .await
        }

        async fn reopen_submission(&self, id: &str) -> Result<()> {
            self.inner.reopen_submission(id).await
        }

        async fn ensure_account(
            &self,
            account_id: &str,
            display_name: &str,
        ) -> Result<crate::db::schemas::AccountDoc> {
            self.inner.ensure_account(account_id, display_name).await
        }

        async fn account(
            &self,
            account_id: &str,
        ) -> Result<Option<crate::db::schemas::AccountDoc>> {
            self.inner.account(account_id).await
        }

        async fn apply_award(
            &self,
            _account_id: &str,
            _target_id: &str,
            _points: i64,
        ) -> Result<Option<i64>> {
            Err(GreenwayError::Database("account write refused".into()))
        }

        async fn grant_badges(&self, account_id: &str, badges: &[String]) -> Result<()> {
            self.inner.grant_badges(account_id, badges).await
        }

        async fn leaderboard(
            &self,
            limit: usize,
        ) -> Result<Vec<crate::db::schemas::AccountDoc>> {
            self.inner.leaderboard(limit).await
        }

        async fn open_role_request(
            &self,
            account_id: &str,
            requested: crate::auth::RequestedRole,
        ) -> Result<Option<crate::db::schemas::AccountDoc>> {
            self.inner.open_role_request(account_id, requested).await
        }

        async fn resolve_role_request(
            &self,
            account_id: &str,
            requested: crate::auth::RequestedRole,
            approve: bool,
        ) -> Result<Option<crate::db::schemas::AccountDoc>> {
            self.inner
                .resolve_role_request(account_id, requested, approve)
                .await
        }

        async fn pending_role_requests(&self) -> Result<Vec<crate::db::schemas::AccountDoc>> {
            self.inner.pending_role_requests().await
        }

        async fn insert_target(
            &self,
            target: crate::db::schemas::TargetDoc,
        ) -> Result<crate::db::schemas::TargetDoc> {
            self.inner.insert_target(target).await
        }

        async fn target_by_id(
            &self,
            id: &str,
        ) -> Result<Option<crate::db::schemas::TargetDoc>> {
            self.inner.target_by_id(id).await
        }

        async fn list_targets(&self) -> Result<Vec<crate::db::schemas::TargetDoc>> {
            self.inner.list_targets().await
        }
    }

    #[tokio::test]
    async fn failed_award_fails_the_review_and_reopens_the_submission() {
        use crate::ledger::MemoryStore;
        use crate::notify::MemoryNotifier;

        let ledger = Ledger::new(
            Arc::new(UnpaidAwardStore {
                inner: MemoryStore::new(),
            }),
            Arc::new(MemoryNotifier::new()),
        );

        let target_id = seed_target(&ledger, 50).await;
        let sub = submit(&ledger, &target_id).await.unwrap();
        let id = sub._id.unwrap().to_hex();

        let err = ledger
            .review_submission("partner-1", &id, ReviewDecision::Approved, None)
            .await
            .unwrap_err();
        assert!(matches!(err, GreenwayError::Database(_)));

        // No approved-but-unpaid state: the claim was compensated back to
        // pending and no points moved
        let after = ledger.submission(&id).await.unwrap().unwrap();
        assert_eq!(after.status, SubmissionStatus::Pending);
        assert!(after.reviewer_id.is_none());
        assert!(after.reviewed_at.is_none());

        let account = ledger.account("student-1").await.unwrap().unwrap();
        assert_eq!(account.points, 0);
        assert!(account.completed_targets.is_empty());

        // The reopened submission is reviewable again
        let err = ledger
            .review_submission("partner-2", &id, ReviewDecision::Approved, None)
            .await
            .unwrap_err();
        assert!(matches!(err, GreenwayError::Database(_)));
    }

    #[tokio::test]
    async fn approval_notifies_the_principal() {
        let (ledger, notifier) = test_ledger();
        let target_id = seed_target(&ledger, 50).await;

        let sub = submit(&ledger, &target_id).await.unwrap();
        ledger
            .review_submission(
                "partner-1",
                &sub._id.unwrap().to_hex(),
                ReviewDecision::Approved,
                None,
            )
            .await
            .unwrap();

        let delivered = notifier.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].account_id, "student-1");
        assert_eq!(delivered[0].kind, NotificationKind::SubmissionApproved);
    }
}
