//! Award engine
//!
//! Pays out the points for an approved submission at most once per
//! (account, target) pair. The store performs the membership check and the
//! point increment as one conditional update; a pair already in
//! `completed_targets` is a no-op success so the operation is safe to retry.

use tracing::info;

use crate::ledger::Ledger;
use crate::types::{GreenwayError, Result};

/// Point thresholds and the badge unlocked at each
pub const BADGE_THRESHOLDS: &[(i64, &str)] = &[
    (50, "seedling"),
    (200, "sapling"),
    (500, "grove"),
    (1000, "evergreen"),
];

/// All badges a point total has earned
pub fn badges_for(points: i64) -> Vec<String> {
    BADGE_THRESHOLDS
        .iter()
        .filter(|(threshold, _)| points >= *threshold)
        .map(|(_, name)| (*name).to_string())
        .collect()
}

impl Ledger {
    /// Apply the award for one (account, target) pair.
    ///
    /// Returns the account's point total afterwards whether or not this call
    /// was the one that applied it.
    pub async fn award(&self, account_id: &str, target_id: &str, points: i64) -> Result<i64> {
        match self.store.apply_award(account_id, target_id, points).await? {
            Some(total) => {
                info!(
                    account_id = %account_id,
                    target_id = %target_id,
                    points = points,
                    total = total,
                    "Award applied"
                );
                let badges = badges_for(total);
                self.store.grant_badges(account_id, &badges).await?;
                Ok(total)
            }
            None => {
                // Either the target was already paid for or the account is
                // missing; only the former is a no-op success
                let account = self
                    .store
                    .account(account_id)
                    .await?
                    .ok_or_else(|| GreenwayError::NotFound("Account not found".into()))?;
                Ok(account.points)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::testutil::test_ledger;
    use std::sync::Arc;

    #[tokio::test]
    async fn badge_thresholds_accumulate() {
        assert!(badges_for(0).is_empty());
        assert_eq!(badges_for(50), vec!["seedling"]);
        assert_eq!(badges_for(250), vec!["seedling", "sapling"]);
        assert_eq!(
            badges_for(1200),
            vec!["seedling", "sapling", "grove", "evergreen"]
        );
    }

    #[tokio::test]
    async fn award_applies_once_per_pair() {
        let (ledger, _) = test_ledger();
        ledger.ensure_account("acct-1", "Sam").await.unwrap();

        let total = ledger.award("acct-1", "target-1", 50).await.unwrap();
        assert_eq!(total, 50);

        // Retry with identical arguments is a no-op success
        let total = ledger.award("acct-1", "target-1", 50).await.unwrap();
        assert_eq!(total, 50);

        let account = ledger.account("acct-1").await.unwrap().unwrap();
        assert_eq!(account.points, 50);
        assert_eq!(
            account
                .completed_targets
                .iter()
                .filter(|t| *t == "target-1")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn distinct_targets_accumulate_points() {
        let (ledger, _) = test_ledger();
        ledger.ensure_account("acct-1", "Sam").await.unwrap();

        ledger.award("acct-1", "target-1", 30).await.unwrap();
        let total = ledger.award("acct-1", "target-2", 40).await.unwrap();
        assert_eq!(total, 70);
    }

    #[tokio::test]
    async fn award_grants_threshold_badges() {
        let (ledger, _) = test_ledger();
        ledger.ensure_account("acct-1", "Sam").await.unwrap();

        ledger.award("acct-1", "target-1", 60).await.unwrap();
        let account = ledger.account("acct-1").await.unwrap().unwrap();
        assert_eq!(account.badges, vec!["seedling"]);

        ledger.award("acct-1", "target-2", 200).await.unwrap();
        let account = ledger.account("acct-1").await.unwrap().unwrap();
        assert_eq!(account.badges, vec!["seedling", "sapling"]);
    }

    #[tokio::test]
    async fn award_for_unknown_account_fails() {
        let (ledger, _) = test_ledger();
        let err = ledger.award("ghost", "target-1", 10).await.unwrap_err();
        assert!(matches!(err, GreenwayError::NotFound(_)));
    }

    #[tokio::test]
    async fn racing_awards_pay_once() {
        let (ledger, _) = test_ledger();
        let ledger = Arc::new(ledger);
        ledger.ensure_account("acct-1", "Sam").await.unwrap();

        let a = {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.award("acct-1", "target-1", 50).await })
        };
        let b = {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.award("acct-1", "target-1", 50).await })
        };

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let account = ledger.account("acct-1").await.unwrap().unwrap();
        assert_eq!(account.points, 50);
    }
}
