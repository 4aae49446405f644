//! Target catalog routes
//!
//! Quests and challenges are created by partners/admins and browsed by
//! everyone.

use hyper::body::Incoming;
use hyper::{Request, StatusCode};
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::db::schemas::{TargetDoc, TargetKind};
use crate::routes::{authenticate, json_response, parse_json_body, require_role, HttpResponse};
use crate::server::AppState;
use crate::types::{GreenwayError, Result};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetView {
    pub id: String,
    pub kind: TargetKind,
    pub title: String,
    pub description: String,
    pub points: i64,
    pub created_by: String,
    pub is_active: bool,
}

impl From<&TargetDoc> for TargetView {
    fn from(target: &TargetDoc) -> Self {
        Self {
            id: target._id.map(|o| o.to_hex()).unwrap_or_default(),
            kind: target.kind,
            title: target.title.clone(),
            description: target.description.clone(),
            points: target.points,
            created_by: target.created_by.clone(),
            is_active: target.is_active,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTargetRequest {
    kind: String,
    title: String,
    #[serde(default)]
    description: String,
    points: i64,
}

/// POST /api/targets
pub async fn create(state: &AppState, req: Request<Incoming>) -> Result<HttpResponse> {
    let principal = authenticate(state, req.headers()).await?;
    require_role(&principal, Role::Partner)?;

    let body: CreateTargetRequest = parse_json_body(req, 64 * 1024).await?;
    let kind = match body.kind.as_str() {
        "quest" => TargetKind::Quest,
        "challenge" => TargetKind::Challenge,
        other => {
            return Err(GreenwayError::Validation(format!(
                "Invalid target kind '{}'",
                other
            )))
        }
    };

    let target = state
        .ledger
        .create_target(
            &principal.account_id,
            kind,
            &body.title,
            &body.description,
            body.points,
        )
        .await?;

    json_response(StatusCode::CREATED, &TargetView::from(&target))
}

/// GET /api/targets
pub async fn list(state: &AppState, req: Request<Incoming>) -> Result<HttpResponse> {
    authenticate(state, req.headers()).await?;

    let items = state.ledger.list_targets().await?;
    let views: Vec<TargetView> = items.iter().map(TargetView::from).collect();
    json_response(StatusCode::OK, &views)
}

/// GET /api/targets/{id}
pub async fn get(state: &AppState, req: Request<Incoming>, id: &str) -> Result<HttpResponse> {
    authenticate(state, req.headers()).await?;

    let target = state
        .ledger
        .target(id)
        .await?
        .ok_or_else(|| GreenwayError::NotFound("Target not found".into()))?;
    json_response(StatusCode::OK, &TargetView::from(&target))
}
