//! Outbound notifications
//!
//! Terminal ledger transitions emit a notification for the affected account.
//! Delivery is fire-and-forget: a failed write is logged and never fails the
//! transition that triggered it.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use std::str::FromStr;
use std::sync::Mutex;

use crate::db::schemas::{NotificationDoc, NotificationKind, NOTIFICATION_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{GreenwayError, Result};

/// Sink for account-facing event notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Record an event for an account's inbox
    async fn notify(&self, account_id: &str, kind: NotificationKind, message: &str) -> Result<()>;

    /// All notifications for an account, newest first
    async fn notifications_for(&self, account_id: &str) -> Result<Vec<NotificationDoc>>;

    /// Mark one of the account's notifications read; false if not found
    async fn mark_read(&self, account_id: &str, notification_id: &str) -> Result<bool>;
}

/// MongoDB-backed notifier
pub struct MongoNotifier {
    collection: MongoCollection<NotificationDoc>,
}

impl MongoNotifier {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            collection: client.collection(NOTIFICATION_COLLECTION).await?,
        })
    }
}

#[async_trait]
impl Notifier for MongoNotifier {
    async fn notify(&self, account_id: &str, kind: NotificationKind, message: &str) -> Result<()> {
        let doc = NotificationDoc::new(account_id.to_string(), kind, message.to_string());
        self.collection.insert_one(doc).await?;
        Ok(())
    }

    async fn notifications_for(&self, account_id: &str) -> Result<Vec<NotificationDoc>> {
        let mut items = self
            .collection
            .find_many(doc! { "account_id": account_id })
            .await?;
        items.sort_by(|a, b| b.metadata.created_at.cmp(&a.metadata.created_at));
        Ok(items)
    }

    async fn mark_read(&self, account_id: &str, notification_id: &str) -> Result<bool> {
        let oid = ObjectId::from_str(notification_id)
            .map_err(|_| GreenwayError::BadRequest("Invalid notification id".into()))?;

        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": oid, "account_id": account_id },
                doc! { "$set": { "read": true } },
            )
            .await?;

        Ok(updated.is_some())
    }
}

/// In-memory notifier for dev mode and tests
#[derive(Default)]
pub struct MemoryNotifier {
    items: Mutex<Vec<NotificationDoc>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything delivered so far, for assertions
    pub fn delivered(&self) -> Vec<NotificationDoc> {
        self.items.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn notify(&self, account_id: &str, kind: NotificationKind, message: &str) -> Result<()> {
        let mut doc = NotificationDoc::new(account_id.to_string(), kind, message.to_string());
        doc._id = Some(ObjectId::new());
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(doc);
        Ok(())
    }

    async fn notifications_for(&self, account_id: &str) -> Result<Vec<NotificationDoc>> {
        let mut items: Vec<NotificationDoc> = self
            .items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|n| n.account_id == account_id)
            .cloned()
            .collect();
        items.reverse();
        Ok(items)
    }

    async fn mark_read(&self, account_id: &str, notification_id: &str) -> Result<bool> {
        let oid = ObjectId::from_str(notification_id)
            .map_err(|_| GreenwayError::BadRequest("Invalid notification id".into()))?;

        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        for item in items.iter_mut() {
            if item._id == Some(oid) && item.account_id == account_id {
                item.read = true;
                return Ok(true);
            }
        }
        Ok(false)
    }
}
