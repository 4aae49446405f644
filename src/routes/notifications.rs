//! Notification inbox routes

use hyper::body::Incoming;
use hyper::{Request, StatusCode};
use serde::Serialize;

use crate::db::schemas::{NotificationDoc, NotificationKind};
use crate::routes::{authenticate, json_response, opt_rfc3339, HttpResponse};
use crate::server::AppState;
use crate::types::{GreenwayError, Result};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: String,
    pub kind: NotificationKind,
    pub message: String,
    pub read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl From<&NotificationDoc> for NotificationView {
    fn from(n: &NotificationDoc) -> Self {
        Self {
            id: n._id.map(|o| o.to_hex()).unwrap_or_default(),
            kind: n.kind,
            message: n.message.clone(),
            read: n.read,
            created_at: opt_rfc3339(n.metadata.created_at),
        }
    }
}

/// GET /api/notifications
pub async fn list(state: &AppState, req: Request<Incoming>) -> Result<HttpResponse> {
    let principal = authenticate(state, req.headers()).await?;

    let items = state
        .notifier
        .notifications_for(&principal.account_id)
        .await?;
    let views: Vec<NotificationView> = items.iter().map(NotificationView::from).collect();
    json_response(StatusCode::OK, &views)
}

/// PUT /api/notifications/{id}/read
pub async fn mark_read(state: &AppState, req: Request<Incoming>, id: &str) -> Result<HttpResponse> {
    let principal = authenticate(state, req.headers()).await?;

    let found = state.notifier.mark_read(&principal.account_id, id).await?;
    if !found {
        return Err(GreenwayError::NotFound("Notification not found".into()));
    }

    json_response(StatusCode::OK, &serde_json::json!({ "read": true }))
}
