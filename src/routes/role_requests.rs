//! Role request routes
//!
//! Anyone may open a request for partner or admin; only admins see the
//! queue and resolve requests.

use hyper::body::Incoming;
use hyper::{Request, StatusCode};
use serde::{Deserialize, Serialize};

use crate::auth::{RequestedRole, Role};
use crate::db::schemas::AccountDoc;
use crate::routes::{authenticate, json_response, parse_json_body, require_role, HttpResponse};
use crate::server::AppState;
use crate::types::{GreenwayError, Result};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequestView {
    pub account_id: String,
    pub display_name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_role: Option<RequestedRole>,
    pub role_request_approved: bool,
}

impl From<&AccountDoc> for RoleRequestView {
    fn from(account: &AccountDoc) -> Self {
        Self {
            account_id: account.account_id.clone(),
            display_name: account.display_name.clone(),
            role: account.role,
            requested_role: account.requested_role,
            role_request_approved: account.role_request_approved,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoleRequestBody {
    requested_role: String,
}

/// POST /api/role-requests
pub async fn create(state: &AppState, req: Request<Incoming>) -> Result<HttpResponse> {
    let principal = authenticate(state, req.headers()).await?;

    let body: RoleRequestBody = parse_json_body(req, 16 * 1024).await?;
    let requested: RequestedRole = body.requested_role.parse().map_err(|_| {
        GreenwayError::Validation(format!("Invalid role '{}'", body.requested_role))
    })?;

    let account = state
        .ledger
        .request_role(&principal.account_id, &principal.display_name, requested)
        .await?;

    json_response(StatusCode::CREATED, &RoleRequestView::from(&account))
}

/// GET /api/role-requests
pub async fn list(state: &AppState, req: Request<Incoming>) -> Result<HttpResponse> {
    let principal = authenticate(state, req.headers()).await?;
    require_role(&principal, Role::Admin)?;

    let accounts = state.ledger.pending_role_requests().await?;
    let views: Vec<RoleRequestView> = accounts.iter().map(RoleRequestView::from).collect();
    json_response(StatusCode::OK, &views)
}

/// PUT /api/role-requests/{accountId}/approve
pub async fn approve(
    state: &AppState,
    req: Request<Incoming>,
    account_id: &str,
) -> Result<HttpResponse> {
    let principal = authenticate(state, req.headers()).await?;
    require_role(&principal, Role::Admin)?;

    let account = state.ledger.approve_role_request(account_id).await?;
    json_response(StatusCode::OK, &RoleRequestView::from(&account))
}

/// PUT /api/role-requests/{accountId}/reject
pub async fn reject(
    state: &AppState,
    req: Request<Incoming>,
    account_id: &str,
) -> Result<HttpResponse> {
    let principal = authenticate(state, req.headers()).await?;
    require_role(&principal, Role::Admin)?;

    let account = state.ledger.reject_role_request(account_id).await?;
    json_response(StatusCode::OK, &RoleRequestView::from(&account))
}
