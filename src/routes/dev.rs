//! Dev-mode token minting
//!
//! Only mounted when --dev-mode is set: lets a developer or test client get
//! a signed token without standing up the real identity provider.

use hyper::body::Incoming;
use hyper::{Request, StatusCode};
use serde::Deserialize;

use crate::auth::{Role, TokenInput};
use crate::routes::{json_response, parse_json_body, HttpResponse};
use crate::server::AppState;
use crate::types::{GreenwayError, Result};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DevTokenRequest {
    account_id: String,
    display_name: String,
    #[serde(default)]
    role: Option<String>,
}

/// POST /api/dev/token
pub async fn token(state: &AppState, req: Request<Incoming>) -> Result<HttpResponse> {
    if !state.args.dev_mode {
        return Err(GreenwayError::NotFound("Not found".into()));
    }

    let body: DevTokenRequest = parse_json_body(req, 16 * 1024).await?;
    let role = match body.role.as_deref() {
        None | Some("user") => Role::User,
        Some("partner") => Role::Partner,
        Some("admin") => Role::Admin,
        Some(other) => {
            return Err(GreenwayError::Validation(format!(
                "Invalid role '{}'",
                other
            )))
        }
    };

    let token = state.jwt.generate_token(TokenInput {
        account_id: body.account_id,
        display_name: body.display_name,
        role,
    })?;

    json_response(StatusCode::OK, &serde_json::json!({ "token": token }))
}
