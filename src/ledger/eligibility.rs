//! Eligibility guard
//!
//! Pure policy over a (principal, target) pair's submission history. The
//! caller fetches the history; this decides whether a new attempt is
//! permitted. An approved submission forecloses the pair permanently; a
//! pending one blocks until reviewed; rejection leaves the slot open.

use crate::db::schemas::{SubmissionDoc, SubmissionStatus};
use crate::types::{GreenwayError, Result};

/// Check whether a new submission is permitted given the pair's history.
///
/// Approval wins over pending when both somehow appear, so the caller gets
/// the stronger "already completed" answer.
pub fn can_submit(history: &[SubmissionDoc]) -> Result<()> {
    if history
        .iter()
        .any(|s| s.status == SubmissionStatus::Approved)
    {
        return Err(GreenwayError::AlreadyCompleted);
    }
    if history.iter().any(|s| s.status == SubmissionStatus::Pending) {
        return Err(GreenwayError::DuplicateSubmission);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::TargetKind;

    fn sub(status: SubmissionStatus) -> SubmissionDoc {
        let mut s = SubmissionDoc::new(
            "acct-1".into(),
            "target-1".into(),
            TargetKind::Quest,
            "did the thing".into(),
            "http://media/proof.jpg".into(),
        );
        s.status = status;
        s
    }

    #[test]
    fn empty_history_is_allowed() {
        assert!(can_submit(&[]).is_ok());
    }

    #[test]
    fn pending_blocks_new_submission() {
        let err = can_submit(&[sub(SubmissionStatus::Pending)]).unwrap_err();
        assert!(matches!(err, GreenwayError::DuplicateSubmission));
    }

    #[test]
    fn approved_blocks_permanently() {
        let err = can_submit(&[sub(SubmissionStatus::Approved)]).unwrap_err();
        assert!(matches!(err, GreenwayError::AlreadyCompleted));
    }

    #[test]
    fn approval_outranks_pending() {
        let history = vec![sub(SubmissionStatus::Pending), sub(SubmissionStatus::Approved)];
        let err = can_submit(&history).unwrap_err();
        assert!(matches!(err, GreenwayError::AlreadyCompleted));
    }

    #[test]
    fn rejected_history_reopens_the_slot() {
        let history = vec![sub(SubmissionStatus::Rejected), sub(SubmissionStatus::Rejected)];
        assert!(can_submit(&history).is_ok());
    }
}
