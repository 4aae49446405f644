//! HTTP route handlers
//!
//! One module per resource. Shared here: principal resolution from the
//! bearer token, JSON body parsing, and response helpers. Wire names are
//! camelCase; errors are `{"error", "code"}` bodies.

pub mod accounts;
pub mod dev;
pub mod health;
pub mod media;
pub mod notifications;
pub mod posts;
pub mod role_requests;
pub mod submissions;
pub mod targets;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::header::{HeaderMap, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::{extract_token_from_header, Role};
use crate::server::AppState;
use crate::types::{GreenwayError, Result};

pub type HttpResponse = Response<Full<Bytes>>;

/// The authenticated caller, resolved against the account document.
///
/// The token's role claim is only trusted until the account is provisioned;
/// after that the document wins, so role elevation takes effect without a
/// token reissue.
#[derive(Debug, Clone)]
pub struct Principal {
    pub account_id: String,
    pub display_name: String,
    pub role: Role,
}

/// Verify the bearer token and resolve the acting principal
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Principal> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let token = extract_token_from_header(header)
        .ok_or_else(|| GreenwayError::Unauthorized("Missing bearer token".into()))?;

    let result = state.jwt.verify_token(token);
    let claims = match result.claims {
        Some(claims) => claims,
        None => {
            let reason = result.error.unwrap_or_else(|| "Invalid token".into());
            return Err(GreenwayError::Unauthorized(reason));
        }
    };

    let account = state
        .ledger
        .ensure_account(&claims.account_id, &claims.display_name)
        .await?;

    Ok(Principal {
        account_id: account.account_id,
        display_name: account.display_name,
        role: account.role,
    })
}

/// Fail unless the principal holds at least `min` privilege
pub fn require_role(principal: &Principal, min: Role) -> Result<()> {
    if principal.role >= min {
        Ok(())
    } else {
        Err(GreenwayError::Forbidden(format!(
            "Requires {} role",
            min
        )))
    }
}

/// Collect and deserialize a JSON request body, bounded by `limit` bytes.
///
/// The cap is enforced before buffering: an honest Content-Length above the
/// limit is refused outright, and a streamed body is dropped as soon as the
/// received bytes exceed the limit.
pub async fn parse_json_body<T, B>(req: Request<B>, limit: usize) -> Result<T>
where
    T: DeserializeOwned,
    B: Body<Data = Bytes> + Unpin,
    B::Error: std::fmt::Display,
{
    let declared = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if matches!(declared, Some(len) if len > limit) {
        return Err(GreenwayError::BadRequest("Request body too large".into()));
    }

    let mut body = req.into_body();
    let mut buf: Vec<u8> = Vec::new();
    while let Some(frame) = body.frame().await {
        let frame =
            frame.map_err(|e| GreenwayError::BadRequest(format!("Failed to read body: {}", e)))?;
        if let Some(data) = frame.data_ref() {
            if buf.len() + data.len() > limit {
                return Err(GreenwayError::BadRequest("Request body too large".into()));
            }
            buf.extend_from_slice(data);
        }
    }

    serde_json::from_slice(&buf)
        .map_err(|e| GreenwayError::BadRequest(format!("Invalid JSON: {}", e)))
}

fn build_response(status: StatusCode, content_type: &str, bytes: Vec<u8>) -> HttpResponse {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .body(Full::new(Bytes::from(bytes)))
        .unwrap_or_else(|_| {
            let mut res = Response::new(Full::new(Bytes::new()));
            *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            res
        })
}

/// Serialize a value as a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Result<HttpResponse> {
    let bytes = serde_json::to_vec(value)
        .map_err(|e| GreenwayError::Internal(format!("Response encoding failed: {}", e)))?;
    Ok(build_response(status, "application/json", bytes))
}

/// Render an error as its JSON body and status
pub fn error_response(err: &GreenwayError) -> HttpResponse {
    let body = serde_json::json!({
        "error": err.to_string(),
        "code": err.code(),
    });
    let bytes = serde_json::to_vec(&body).unwrap_or_else(|_| Vec::new());
    build_response(err.status_code(), "application/json", bytes)
}

/// Raw bytes response, used by the media route
pub fn bytes_response(status: StatusCode, content_type: &str, bytes: Vec<u8>) -> HttpResponse {
    build_response(status, content_type, bytes)
}

/// RFC 3339 rendering for wire timestamps
pub fn rfc3339(dt: bson::DateTime) -> String {
    dt.to_chrono().to_rfc3339()
}

pub fn opt_rfc3339(dt: Option<bson::DateTime>) -> Option<String> {
    dt.map(rfc3339)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        name: String,
    }

    fn json_request(body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    #[tokio::test]
    async fn body_within_limit_parses() {
        let req = json_request(r#"{"name":"compost"}"#);
        let parsed: Payload = parse_json_body(req, 1024).await.unwrap();
        assert_eq!(parsed.name, "compost");
    }

    #[tokio::test]
    async fn oversized_body_is_refused() {
        let req = json_request(&format!(r#"{{"name":"{}"}}"#, "x".repeat(256)));
        let err = parse_json_body::<Payload, _>(req, 64).await.unwrap_err();
        assert!(matches!(err, GreenwayError::BadRequest(_)));
    }

    #[tokio::test]
    async fn oversized_content_length_is_refused_up_front() {
        let req = Request::builder()
            .header(CONTENT_LENGTH, "999999")
            .body(Full::new(Bytes::from_static(b"{}")))
            .unwrap();
        let err = parse_json_body::<Payload, _>(req, 64).await.unwrap_err();
        assert!(matches!(err, GreenwayError::BadRequest(_)));
    }

    #[tokio::test]
    async fn invalid_json_is_a_bad_request() {
        let req = json_request("not json");
        let err = parse_json_body::<Payload, _>(req, 1024).await.unwrap_err();
        assert!(matches!(err, GreenwayError::BadRequest(_)));
    }
}
