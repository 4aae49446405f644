//! Account profile and leaderboard routes

use hyper::body::Incoming;
use hyper::{Request, StatusCode};
use serde::Serialize;

use crate::auth::{RequestedRole, Role};
use crate::db::schemas::AccountDoc;
use crate::routes::{authenticate, json_response, HttpResponse};
use crate::server::AppState;
use crate::types::{GreenwayError, Result};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub account_id: String,
    pub display_name: String,
    pub role: Role,
    pub points: i64,
    pub completed_targets: Vec<String>,
    pub badges: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_role: Option<RequestedRole>,
}

impl From<&AccountDoc> for AccountView {
    fn from(account: &AccountDoc) -> Self {
        Self {
            account_id: account.account_id.clone(),
            display_name: account.display_name.clone(),
            role: account.role,
            points: account.points,
            completed_targets: account.completed_targets.clone(),
            badges: account.badges.clone(),
            requested_role: account.requested_role,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub display_name: String,
    pub points: i64,
    pub badges: Vec<String>,
}

/// GET /api/accounts/me
pub async fn me(state: &AppState, req: Request<Incoming>) -> Result<HttpResponse> {
    let principal = authenticate(state, req.headers()).await?;

    let account = state
        .ledger
        .account(&principal.account_id)
        .await?
        .ok_or_else(|| GreenwayError::NotFound("Account not found".into()))?;

    json_response(StatusCode::OK, &AccountView::from(&account))
}

/// GET /api/leaderboard
pub async fn leaderboard(state: &AppState, req: Request<Incoming>) -> Result<HttpResponse> {
    authenticate(state, req.headers()).await?;

    let accounts = state.ledger.leaderboard(state.args.leaderboard_size).await?;
    let entries: Vec<LeaderboardEntry> = accounts
        .iter()
        .enumerate()
        .map(|(i, a)| LeaderboardEntry {
            rank: i + 1,
            display_name: a.display_name.clone(),
            points: a.points,
            badges: a.badges.clone(),
        })
        .collect();

    json_response(StatusCode::OK, &entries)
}
