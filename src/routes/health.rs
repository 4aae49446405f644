//! Health and version probes

use hyper::StatusCode;

use crate::routes::{json_response, HttpResponse};
use crate::server::AppState;
use crate::types::Result;

/// GET /health, GET /healthz
pub fn health(state: &AppState) -> Result<HttpResponse> {
    json_response(
        StatusCode::OK,
        &serde_json::json!({
            "status": "healthy",
            "devMode": state.args.dev_mode,
        }),
    )
}

/// GET /version
pub fn version(state: &AppState) -> Result<HttpResponse> {
    json_response(
        StatusCode::OK,
        &serde_json::json!({
            "name": "greenway",
            "version": env!("CARGO_PKG_VERSION"),
            "nodeId": state.args.node_id.to_string(),
        }),
    )
}
