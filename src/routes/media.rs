//! Media serving route
//!
//! Serves objects the disk store wrote; URLs embedded in submissions and
//! posts point here. Unauthenticated, like any static asset.

use hyper::StatusCode;

use crate::routes::{bytes_response, error_response, HttpResponse};
use crate::server::AppState;
use crate::types::{GreenwayError, Result};

/// GET /media/{name}
pub async fn get(state: &AppState, name: &str) -> Result<HttpResponse> {
    match state.objects.get(name).await? {
        Some((bytes, content_type)) => Ok(bytes_response(StatusCode::OK, &content_type, bytes)),
        None => Ok(error_response(&GreenwayError::NotFound(
            "Media not found".into(),
        ))),
    }
}
