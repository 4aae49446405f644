//! MongoDB-backed ledger store
//!
//! Each conditional transition is one `find_one_and_update` whose filter
//! carries the precondition, so racing callers are serialized by the storage
//! engine. The live-pair invariant on submissions is enforced by the unique
//! partial index declared on the schema; an insert that loses that race
//! surfaces as a duplicate-key error.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime};
use futures_util::StreamExt;
use mongodb::error::{ErrorKind, WriteFailure};
use std::str::FromStr;
use tracing::error;

use crate::auth::RequestedRole;
use crate::db::schemas::{
    AccountDoc, ReviewDecision, SubmissionDoc, SubmissionStatus, TargetDoc, ACCOUNT_COLLECTION,
    SUBMISSION_COLLECTION, TARGET_COLLECTION,
};
use crate::db::{MongoClient, MongoCollection};
use crate::ledger::store::LedgerStore;
use crate::types::{GreenwayError, Result};

/// Ledger store over MongoDB collections
pub struct MongoLedgerStore {
    submissions: MongoCollection<SubmissionDoc>,
    accounts: MongoCollection<AccountDoc>,
    targets: MongoCollection<TargetDoc>,
}

impl MongoLedgerStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            submissions: client.collection(SUBMISSION_COLLECTION).await?,
            accounts: client.collection(ACCOUNT_COLLECTION).await?,
            targets: client.collection(TARGET_COLLECTION).await?,
        })
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match &*err.kind {
        ErrorKind::Write(WriteFailure::WriteError(we)) => we.code == 11000,
        _ => false,
    }
}

fn parse_oid(id: &str) -> Option<ObjectId> {
    ObjectId::from_str(id).ok()
}

#[async_trait]
impl LedgerStore for MongoLedgerStore {
    async fn insert_submission(&self, submission: SubmissionDoc) -> Result<SubmissionDoc> {
        // Raw insert so a duplicate-key loss of the live-pair race is
        // distinguishable from other write failures
        let mut submission = submission;
        let result = self.submissions.inner().insert_one(&submission).await;

        match result {
            Ok(res) => {
                submission._id = res.inserted_id.as_object_id();
                Ok(submission)
            }
            Err(e) if is_duplicate_key(&e) => Err(GreenwayError::DuplicateSubmission),
            Err(e) => Err(GreenwayError::Database(format!("Insert failed: {}", e))),
        }
    }

    async fn submission_by_id(&self, id: &str) -> Result<Option<SubmissionDoc>> {
        let Some(oid) = parse_oid(id) else {
            return Ok(None);
        };
        self.submissions.find_one(doc! { "_id": oid }).await
    }

    async fn submissions_for_pair(
        &self,
        principal_id: &str,
        target_id: &str,
    ) -> Result<Vec<SubmissionDoc>> {
        self.submissions
            .find_many(doc! { "principal_id": principal_id, "target_id": target_id })
            .await
    }

    async fn submissions_by_principal(&self, principal_id: &str) -> Result<Vec<SubmissionDoc>> {
        let mut items = self
            .submissions
            .find_many(doc! { "principal_id": principal_id })
            .await?;
        items.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(items)
    }

    async fn pending_submissions(&self) -> Result<Vec<SubmissionDoc>> {
        let mut items = self
            .submissions
            .find_many(doc! { "status": SubmissionStatus::Pending.as_str() })
            .await?;
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
        let Some(oid) = parse_oid(id) else {
            return Ok(None);
        };

        let status = match decision {
            ReviewDecision::Approved => SubmissionStatus::Approved,
            ReviewDecision::Rejected => SubmissionStatus::Rejected,
        };

        let mut set = doc! {
            "status": status.as_str(),
            "reviewer_id": reviewer_id,
            "reviewed_at": DateTime::now(),
            "metadata.updated_at": DateTime::now(),
        };
        if let Some(reason) = rejection_reason {
            set.insert("rejection_reason", reason);
        }

        self.submissions
            .find_one_and_update(
                doc! { "_id": oid, "status": SubmissionStatus::Pending.as_str() },
                doc! { "$set": set },
            )
            .await
    }

    async fn reopen_submission(&self, id: &str) -> Result<()> {
        let Some(oid) = parse_oid(id) else {
            return Ok(());
        };

        self.submissions
            .find_one_and_update(
                doc! { "_id": oid, "status": SubmissionStatus::Approved.as_str() },
                doc! {
                    "$set": {
                        "status": SubmissionStatus::Pending.as_str(),
                        "metadata.updated_at": DateTime::now(),
                    },
                    "$unset": { "reviewer_id": "", "reviewed_at": "" },
                },
            )
            .await?;
        Ok(())
    }

    async fn ensure_account(&self, account_id: &str, display_name: &str) -> Result<AccountDoc> {
        if let Some(account) = self.accounts.find_one(doc! { "account_id": account_id }).await? {
            return Ok(account);
        }

        let mut account = AccountDoc::new(account_id.to_string(), display_name.to_string());
        match self.accounts.inner().insert_one(&account).await {
            Ok(res) => {
                account._id = res.inserted_id.as_object_id();
                Ok(account)
            }
            // Lost a provisioning race; the winner's document is the account
            Err(e) if is_duplicate_key(&e) => self
                .accounts
                .find_one(doc! { "account_id": account_id })
                .await?
                .ok_or_else(|| GreenwayError::Database("Account vanished after insert race".into())),
            Err(e) => Err(GreenwayError::Database(format!("Insert failed: {}", e))),
        }
    }

    async fn account(&self, account_id: &str) -> Result<Option<AccountDoc>> {
        self.accounts.find_one(doc! { "account_id": account_id }).await
    }

    async fn apply_award(
        &self,
        account_id: &str,
        target_id: &str,
        points: i64,
    ) -> Result<Option<i64>> {
        let updated = self
            .accounts
            .find_one_and_update(
                doc! {
                    "account_id": account_id,
                    "completed_targets": { "$ne": target_id },
                },
                doc! {
                    "$inc": { "points": points },
                    "$addToSet": { "completed_targets": target_id },
                    "$set": { "metadata.updated_at": DateTime::now() },
                },
            )
            .await?;

        Ok(updated.map(|a| a.points))
    }

    async fn grant_badges(&self, account_id: &str, badges: &[String]) -> Result<()> {
        if badges.is_empty() {
            return Ok(());
        }

        self.accounts
            .update_one(
                doc! { "account_id": account_id },
                doc! { "$addToSet": { "badges": { "$each": badges.to_vec() } } },
            )
            .await?;
        Ok(())
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<AccountDoc>> {
        let cursor = self
            .accounts
            .inner()
            .find(doc! { "metadata.is_deleted": { "$ne": true } })
            .sort(doc! { "points": -1 })
            .limit(limit as i64)
            .await
            .map_err(|e| GreenwayError::Database(format!("Find failed: {}", e)))?;

        let items: Vec<AccountDoc> = cursor
            .filter_map(|doc| async {
                match doc {
                    Ok(d) => Some(d),
                    Err(e) => {
                        error!("Error reading account: {}", e);
                        None
                    }
                }
            })
            .collect()
            .await;

        Ok(items)
    }

    async fn open_role_request(
        &self,
        account_id: &str,
        requested: RequestedRole,
    ) -> Result<Option<AccountDoc>> {
        self.accounts
            .find_one_and_update(
                doc! { "account_id": account_id, "requested_role": null },
                doc! {
                    "$set": {
                        "requested_role": requested.to_string(),
                        "role_request_approved": false,
                        "metadata.updated_at": DateTime::now(),
                    },
                },
            )
            .await
    }

    async fn resolve_role_request(
        &self,
        account_id: &str,
        requested: RequestedRole,
        approve: bool,
    ) -> Result<Option<AccountDoc>> {
        let mut set = doc! {
            "role_request_approved": approve,
            "metadata.updated_at": DateTime::now(),
        };
        if approve {
            set.insert("role", requested.granted_role().to_string());
        }

        self.accounts
            .find_one_and_update(
                doc! { "account_id": account_id, "requested_role": requested.to_string() },
                doc! { "$set": set, "$unset": { "requested_role": "" } },
            )
            .await
    }

    async fn pending_role_requests(&self) -> Result<Vec<AccountDoc>> {
        self.accounts
            .find_many(doc! { "requested_role": { "$ne": null } })
            .await
    }

    async fn insert_target(&self, target: TargetDoc) -> Result<TargetDoc> {
        let mut target = target;
        let id = self.targets.insert_one(target.clone()).await?;
        target._id = Some(id);
        Ok(target)
    }

    async fn target_by_id(&self, id: &str) -> Result<Option<TargetDoc>> {
        let Some(oid) = parse_oid(id) else {
            return Ok(None);
        };
        self.targets.find_one(doc! { "_id": oid }).await
    }

    async fn list_targets(&self) -> Result<Vec<TargetDoc>> {
        let mut items = self.targets.find_many(doc! {}).await?;
        items.sort_by(|a, b| a.metadata.created_at.cmp(&b.metadata.created_at));
        Ok(items)
    }
}
