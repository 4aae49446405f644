//! Role request ledger
//!
//! A second, independent state machine on the account document: at most one
//! open elevation request per account, resolved exactly once by an admin.
//! Opening and resolving are both conditional updates on the
//! `requested_role` field, so racing admins get one winner and one
//! `NoPendingRequest`.

use tracing::info;

use crate::auth::RequestedRole;
use crate::db::schemas::{AccountDoc, NotificationKind};
use crate::ledger::Ledger;
use crate::types::{GreenwayError, Result};

impl Ledger {
    /// Open an elevation request for the account.
    pub async fn request_role(
        &self,
        account_id: &str,
        display_name: &str,
        requested: RequestedRole,
    ) -> Result<AccountDoc> {
        self.store.ensure_account(account_id, display_name).await?;

        match self.store.open_role_request(account_id, requested).await? {
            Some(account) => {
                info!(account_id = %account_id, requested = %requested, "Role request opened");
                Ok(account)
            }
            None => Err(GreenwayError::AlreadyPending),
        }
    }

    /// Grant a pending request: the account's role becomes the requested one.
    pub async fn approve_role_request(&self, account_id: &str) -> Result<AccountDoc> {
        let requested = self.pending_request_for(account_id).await?;

        match self
            .store
            .resolve_role_request(account_id, requested, true)
            .await?
        {
            Some(account) => {
                info!(account_id = %account_id, role = %account.role, "Role request approved");
                self.notify_quietly(
                    account_id,
                    NotificationKind::RoleApproved,
                    &format!("Your {} role request was approved", requested),
                )
                .await;
                Ok(account)
            }
            // The request was resolved between our read and the write
            None => Err(GreenwayError::NoPendingRequest),
        }
    }

    /// Decline a pending request: the role is left unchanged.
    pub async fn reject_role_request(&self, account_id: &str) -> Result<AccountDoc> {
        let requested = self.pending_request_for(account_id).await?;

        match self
            .store
            .resolve_role_request(account_id, requested, false)
            .await?
        {
            Some(account) => {
                info!(account_id = %account_id, "Role request rejected");
                self.notify_quietly(
                    account_id,
                    NotificationKind::RoleRejected,
                    &format!("Your {} role request was declined", requested),
                )
                .await;
                Ok(account)
            }
            None => Err(GreenwayError::NoPendingRequest),
        }
    }

    /// Accounts awaiting a role decision
    pub async fn pending_role_requests(&self) -> Result<Vec<AccountDoc>> {
        self.store.pending_role_requests().await
    }

    async fn pending_request_for(&self, account_id: &str) -> Result<RequestedRole> {
        let account = self
            .store
            .account(account_id)
            .await?
            .ok_or_else(|| GreenwayError::NotFound("Account not found".into()))?;
        account
            .requested_role
            .ok_or(GreenwayError::NoPendingRequest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::ledger::testutil::test_ledger;

    #[tokio::test]
    async fn approved_request_elevates_the_role() {
        let (ledger, _) = test_ledger();

        ledger
            .request_role("acct-1", "Sam", RequestedRole::Partner)
            .await
            .unwrap();
        let account = ledger.approve_role_request("acct-1").await.unwrap();

        assert_eq!(account.role, Role::Partner);
        assert!(account.requested_role.is_none());
        assert!(account.role_request_approved);
    }

    #[tokio::test]
    async fn resolution_is_one_shot() {
        let (ledger, _) = test_ledger();

        ledger
            .request_role("acct-1", "Sam", RequestedRole::Partner)
            .await
            .unwrap();
        ledger.approve_role_request("acct-1").await.unwrap();

        let err = ledger.approve_role_request("acct-1").await.unwrap_err();
        assert!(matches!(err, GreenwayError::NoPendingRequest));
        let err = ledger.reject_role_request("acct-1").await.unwrap_err();
        assert!(matches!(err, GreenwayError::NoPendingRequest));
    }

    #[tokio::test]
    async fn second_request_while_pending_conflicts() {
        let (ledger, _) = test_ledger();

        ledger
            .request_role("acct-1", "Sam", RequestedRole::Admin)
            .await
            .unwrap();
        let err = ledger
            .request_role("acct-1", "Sam", RequestedRole::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, GreenwayError::AlreadyPending));
    }

    #[tokio::test]
    async fn rejection_leaves_role_unchanged_and_reopens_requests() {
        let (ledger, _) = test_ledger();

        ledger
            .request_role("acct-1", "Sam", RequestedRole::Admin)
            .await
            .unwrap();
        let account = ledger.reject_role_request("acct-1").await.unwrap();
        assert_eq!(account.role, Role::User);
        assert!(account.requested_role.is_none());

        // A new request is allowed after the rejection
        let account = ledger
            .request_role("acct-1", "Sam", RequestedRole::Partner)
            .await
            .unwrap();
        assert_eq!(account.requested_role, Some(RequestedRole::Partner));
    }

    #[tokio::test]
    async fn resolving_with_no_request_fails() {
        let (ledger, _) = test_ledger();
        ledger.ensure_account("acct-1", "Sam").await.unwrap();

        let err = ledger.approve_role_request("acct-1").await.unwrap_err();
        assert!(matches!(err, GreenwayError::NoPendingRequest));
    }

    #[tokio::test]
    async fn resolution_notifies_the_account() {
        let (ledger, notifier) = test_ledger();

        ledger
            .request_role("acct-1", "Sam", RequestedRole::Partner)
            .await
            .unwrap();
        ledger.approve_role_request("acct-1").await.unwrap();

        let delivered = notifier.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].kind, NotificationKind::RoleApproved);
    }

    #[tokio::test]
    async fn pending_requests_listing() {
        let (ledger, _) = test_ledger();

        ledger
            .request_role("acct-1", "Sam", RequestedRole::Partner)
            .await
            .unwrap();
        ledger
            .request_role("acct-2", "Kim", RequestedRole::Admin)
            .await
            .unwrap();
        ledger.approve_role_request("acct-2").await.unwrap();

        let pending = ledger.pending_role_requests().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].account_id, "acct-1");
    }
}
