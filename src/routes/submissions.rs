//! Submission routes
//!
//! Create runs the proof photo through the object store first, then hands
//! the resulting URL to the ledger. Review is partner/admin only.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hyper::body::Incoming;
use hyper::{Request, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::Role;
use crate::db::schemas::{ReviewDecision, SubmissionDoc, SubmissionStatus, TargetKind};
use crate::routes::{
    authenticate, json_response, opt_rfc3339, parse_json_body, require_role, rfc3339, HttpResponse,
    Principal,
};
use crate::server::AppState;
use crate::types::{GreenwayError, Result};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionView {
    pub id: String,
    pub target_id: String,
    pub target_kind: TargetKind,
    pub principal_id: String,
    pub reflection_text: String,
    pub proof_url: String,
    pub status: SubmissionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_id: Option<String>,
    pub submitted_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<String>,
}

impl From<&SubmissionDoc> for SubmissionView {
    fn from(sub: &SubmissionDoc) -> Self {
        Self {
            id: sub._id.map(|o| o.to_hex()).unwrap_or_default(),
            target_id: sub.target_id.clone(),
            target_kind: sub.target_kind,
            principal_id: sub.principal_id.clone(),
            reflection_text: sub.reflection_text.clone(),
            proof_url: sub.proof_url.clone(),
            status: sub.status,
            rejection_reason: sub.rejection_reason.clone(),
            reviewer_id: sub.reviewer_id.clone(),
            submitted_at: rfc3339(sub.submitted_at),
            reviewed_at: opt_rfc3339(sub.reviewed_at),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSubmissionRequest {
    target_id: String,
    #[serde(default)]
    reflection: String,
    /// Inline photo upload, base64-encoded
    proof_base64: Option<String>,
    content_type: Option<String>,
    /// Alternative to the inline upload: an already-stored proof URL
    proof_url: Option<String>,
}

/// POST /api/submissions
pub async fn create(state: &AppState, req: Request<Incoming>) -> Result<HttpResponse> {
    let principal = authenticate(state, req.headers()).await?;

    // Base64 inflates the photo by 4/3; allow for that plus the JSON wrapper
    let limit = state.args.max_proof_bytes * 2;
    let body: CreateSubmissionRequest = parse_json_body(req, limit).await?;

    let (proof_url, stored_name) = match (body.proof_base64, body.proof_url) {
        (Some(encoded), _) => {
            let bytes = BASE64
                .decode(encoded.trim())
                .map_err(|e| GreenwayError::Validation(format!("Invalid proof encoding: {}", e)))?;
            if bytes.is_empty() {
                return Err(GreenwayError::Validation("Proof photo is required".into()));
            }
            if bytes.len() > state.args.max_proof_bytes {
                return Err(GreenwayError::Validation("Proof photo too large".into()));
            }
            let content_type = body.content_type.as_deref().unwrap_or("image/jpeg");
            let url = state.objects.put(&bytes, content_type).await?;
            let name = url.rsplit('/').next().unwrap_or_default().to_string();
            (url, Some(name))
        }
        (None, Some(url)) => (url, None),
        (None, None) => (String::new(), None),
    };

    let submission = match state
        .ledger
        .create_submission(
            &principal.account_id,
            &principal.display_name,
            &body.target_id,
            &body.reflection,
            &proof_url,
        )
        .await
    {
        Ok(submission) => submission,
        Err(err) => {
            // A refused create leaves no orphaned proof object behind
            if let Some(name) = stored_name {
                if let Err(e) = state.objects.delete(&name).await {
                    warn!(name = %name, "Orphaned proof cleanup failed: {}", e);
                }
            }
            return Err(err);
        }
    };

    json_response(StatusCode::CREATED, &SubmissionView::from(&submission))
}

/// GET /api/submissions/mine
pub async fn mine(state: &AppState, req: Request<Incoming>) -> Result<HttpResponse> {
    let principal = authenticate(state, req.headers()).await?;

    let items = state.ledger.submissions_for(&principal.account_id).await?;
    let views: Vec<SubmissionView> = items.iter().map(SubmissionView::from).collect();
    json_response(StatusCode::OK, &views)
}

/// GET /api/submissions/pending
pub async fn pending(state: &AppState, req: Request<Incoming>) -> Result<HttpResponse> {
    let principal = authenticate(state, req.headers()).await?;
    require_role(&principal, Role::Partner)?;

    let items = state.ledger.review_queue().await?;
    let views: Vec<SubmissionView> = items.iter().map(SubmissionView::from).collect();
    json_response(StatusCode::OK, &views)
}

/// GET /api/submissions/{id}
pub async fn get(state: &AppState, req: Request<Incoming>, id: &str) -> Result<HttpResponse> {
    let principal = authenticate(state, req.headers()).await?;

    let submission = state
        .ledger
        .submission(id)
        .await?
        .ok_or_else(|| GreenwayError::NotFound("Submission not found".into()))?;

    visible_to(&principal, &submission)?;
    json_response(StatusCode::OK, &SubmissionView::from(&submission))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewRequest {
    decision: String,
    rejection_reason: Option<String>,
}

/// PUT /api/submissions/{id}/review
pub async fn review(state: &AppState, req: Request<Incoming>, id: &str) -> Result<HttpResponse> {
    let principal = authenticate(state, req.headers()).await?;
    require_role(&principal, Role::Partner)?;

    let body: ReviewRequest = parse_json_body(req, 64 * 1024).await?;
    let decision = match body.decision.as_str() {
        "approved" => ReviewDecision::Approved,
        "rejected" => ReviewDecision::Rejected,
        other => {
            return Err(GreenwayError::Validation(format!(
                "Invalid decision '{}'",
                other
            )))
        }
    };

    let submission = state
        .ledger
        .review_submission(
            &principal.account_id,
            id,
            decision,
            body.rejection_reason.as_deref(),
        )
        .await?;

    json_response(StatusCode::OK, &SubmissionView::from(&submission))
}

/// A submission is visible to its principal and to reviewers
fn visible_to(principal: &Principal, submission: &SubmissionDoc) -> Result<()> {
    if submission.principal_id == principal.account_id || principal.role >= Role::Partner {
        Ok(())
    } else {
        Err(GreenwayError::Forbidden(
            "Not your submission".into(),
        ))
    }
}
