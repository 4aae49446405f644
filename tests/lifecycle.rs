//! End-to-end lifecycle tests over the in-memory store
//!
//! Walks the full submit → review → award → role-request flows the way the
//! HTTP layer drives them.

use std::sync::Arc;

use greenway::auth::{RequestedRole, Role};
use greenway::db::schemas::{NotificationKind, ReviewDecision, SubmissionStatus, TargetKind};
use greenway::ledger::{Ledger, MemoryStore};
use greenway::notify::MemoryNotifier;
use greenway::GreenwayError;

fn ledger() -> (Arc<Ledger>, Arc<MemoryNotifier>) {
    let notifier = Arc::new(MemoryNotifier::new());
    let ledger = Arc::new(Ledger::new(
        Arc::new(MemoryStore::new()),
        notifier.clone(),
    ));
    (ledger, notifier)
}

async fn seed_target(ledger: &Ledger, kind: TargetKind, points: i64) -> String {
    ledger
        .create_target("partner-1", kind, "Plant trees", "Plant 5 trees on campus", points)
        .await
        .unwrap()
        ._id
        .unwrap()
        .to_hex()
}

#[tokio::test]
async fn quest_approval_pays_points_and_completes_the_target() {
    let (ledger, notifier) = ledger();
    let quest = seed_target(&ledger, TargetKind::Quest, 50).await;

    let submission = ledger
        .create_submission(
            "student-1",
            "Sam Student",
            &quest,
            "Planted 5 trees",
            "https://x/proof1.jpg",
        )
        .await
        .unwrap();
    assert_eq!(submission.status, SubmissionStatus::Pending);
    assert!(submission.reviewed_at.is_none());

    let reviewed = ledger
        .review_submission(
            "partner-1",
            &submission._id.unwrap().to_hex(),
            ReviewDecision::Approved,
            None,
        )
        .await
        .unwrap();
    assert_eq!(reviewed.status, SubmissionStatus::Approved);

    let account = ledger.account("student-1").await.unwrap().unwrap();
    assert_eq!(account.points, 50);
    assert!(account.completed_targets.contains(&quest));
    assert_eq!(account.badges, vec!["seedling"]);

    let delivered = notifier.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].kind, NotificationKind::SubmissionApproved);
}

#[tokio::test]
async fn rejected_challenge_can_be_resubmitted() {
    let (ledger, _) = ledger();
    let challenge = seed_target(&ledger, TargetKind::Challenge, 30).await;

    let first = ledger
        .create_submission(
            "student-1",
            "Sam Student",
            &challenge,
            "Biked to campus all week",
            "https://x/proof1.jpg",
        )
        .await
        .unwrap();

    let rejected = ledger
        .review_submission(
            "partner-1",
            &first._id.unwrap().to_hex(),
            ReviewDecision::Rejected,
            Some("Photo does not show the action"),
        )
        .await
        .unwrap();
    assert_eq!(rejected.status, SubmissionStatus::Rejected);
    assert_eq!(
        rejected.rejection_reason.as_deref(),
        Some("Photo does not show the action")
    );

    // No points moved
    let account = ledger.account("student-1").await.unwrap().unwrap();
    assert_eq!(account.points, 0);
    assert!(account.completed_targets.is_empty());

    // The slot reopened; a fresh attempt goes back to pending
    let second = ledger
        .create_submission(
            "student-1",
            "Sam Student",
            &challenge,
            "Biked to campus all week, clearer photo",
            "https://x/proof2.jpg",
        )
        .await
        .unwrap();
    assert_eq!(second.status, SubmissionStatus::Pending);
    assert_ne!(second._id, first._id);
}

#[tokio::test]
async fn role_request_flow_with_rejection_and_retry() {
    let (ledger, _) = ledger();

    ledger
        .request_role("student-1", "Sam Student", RequestedRole::Admin)
        .await
        .unwrap();

    // A second request while one is pending conflicts
    let err = ledger
        .request_role("student-1", "Sam Student", RequestedRole::Admin)
        .await
        .unwrap_err();
    assert!(matches!(err, GreenwayError::AlreadyPending));

    // Rejection clears the request and leaves the role alone
    let account = ledger.reject_role_request("student-1").await.unwrap();
    assert_eq!(account.role, Role::User);
    assert!(account.requested_role.is_none());

    // A new request for partner now succeeds and can be approved
    ledger
        .request_role("student-1", "Sam Student", RequestedRole::Partner)
        .await
        .unwrap();
    let account = ledger.approve_role_request("student-1").await.unwrap();
    assert_eq!(account.role, Role::Partner);
}

#[tokio::test]
async fn racing_creates_yield_one_pending_submission() {
    let (ledger, _) = ledger();
    let quest = seed_target(&ledger, TargetKind::Quest, 50).await;

    let a = {
        let ledger = ledger.clone();
        let quest = quest.clone();
        tokio::spawn(async move {
            ledger
                .create_submission("student-1", "Sam", &quest, "done", "https://x/a.jpg")
                .await
        })
    };
    let b = {
        let ledger = ledger.clone();
        let quest = quest.clone();
        tokio::spawn(async move {
            ledger
                .create_submission("student-1", "Sam", &quest, "done", "https://x/b.jpg")
                .await
        })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(GreenwayError::DuplicateSubmission)))
        .count();
    assert_eq!(wins, 1);
    assert_eq!(conflicts, 1);

    let mine = ledger.submissions_for("student-1").await.unwrap();
    assert_eq!(mine.len(), 1);
}

#[tokio::test]
async fn approved_pair_refuses_fresh_submissions_even_after_review_of_others() {
    let (ledger, _) = ledger();
    let quest = seed_target(&ledger, TargetKind::Quest, 20).await;
    let other = seed_target(&ledger, TargetKind::Quest, 40).await;

    let sub = ledger
        .create_submission("student-1", "Sam", &quest, "done", "https://x/a.jpg")
        .await
        .unwrap();
    ledger
        .review_submission(
            "partner-1",
            &sub._id.unwrap().to_hex(),
            ReviewDecision::Approved,
            None,
        )
        .await
        .unwrap();

    let err = ledger
        .create_submission("student-1", "Sam", &quest, "again", "https://x/b.jpg")
        .await
        .unwrap_err();
    assert!(matches!(err, GreenwayError::AlreadyCompleted));

    // A different target is unaffected
    let second = ledger
        .create_submission("student-1", "Sam", &other, "done too", "https://x/c.jpg")
        .await
        .unwrap();
    assert_eq!(second.status, SubmissionStatus::Pending);

    let account = ledger.account("student-1").await.unwrap().unwrap();
    assert_eq!(account.points, 20);
}
