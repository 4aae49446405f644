//! HTTP server implementation
//!
//! hyper http1 with TokioIo; one spawned task per connection. The router is
//! a match over (method, path) with suffix helpers for id-carrying paths.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::feed::FeedStore;
use crate::ledger::Ledger;
use crate::notify::Notifier;
use crate::objstore::ObjectStore;
use crate::routes::{self, error_response, HttpResponse};
use crate::types::{GreenwayError, Result};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub args: Args,
    pub ledger: Arc<Ledger>,
    pub notifier: Arc<dyn Notifier>,
    pub feed: Arc<dyn FeedStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub jwt: JwtValidator,
}

impl AppState {
    pub fn new(
        args: Args,
        ledger: Arc<Ledger>,
        notifier: Arc<dyn Notifier>,
        feed: Arc<dyn FeedStore>,
        objects: Arc<dyn ObjectStore>,
        jwt: JwtValidator,
    ) -> Self {
        Self {
            args,
            ledger,
            notifier,
            feed,
            objects,
            jwt,
        }
    }
}

/// Run the HTTP server until the process is stopped
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Greenway listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - in-memory store, dev JWT secret");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let io = TokioIo::new(stream);
                let state = Arc::clone(&state);

                tokio::task::spawn(async move {
                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<HttpResponse, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    if method == Method::OPTIONS {
        return Ok(preflight_response());
    }

    let result = route(&state, &method, &path, req).await;

    let mut response = match result {
        Ok(response) => response,
        Err(err) => {
            if err.status_code().is_server_error() {
                error!("{} {} failed: {}", method, path, err);
            }
            error_response(&err)
        }
    };

    apply_cors(&mut response);
    Ok(response)
}

async fn route(
    state: &AppState,
    method: &Method,
    path: &str,
    req: Request<Incoming>,
) -> Result<HttpResponse> {
    if method == Method::GET {
        match path {
            "/health" | "/healthz" => return routes::health::health(state),
            "/version" => return routes::health::version(state),
            "/api/submissions/mine" => return routes::submissions::mine(state, req).await,
            "/api/submissions/pending" => return routes::submissions::pending(state, req).await,
            "/api/role-requests" => return routes::role_requests::list(state, req).await,
            "/api/targets" => return routes::targets::list(state, req).await,
            "/api/accounts/me" => return routes::accounts::me(state, req).await,
            "/api/leaderboard" => return routes::accounts::leaderboard(state, req).await,
            "/api/notifications" => return routes::notifications::list(state, req).await,
            "/api/posts" => return routes::posts::list(state, req).await,
            _ => {}
        }
        if let Some(name) = last_segment(path, "/media/") {
            return routes::media::get(state, &name).await;
        }
        if let Some(id) = last_segment(path, "/api/targets/") {
            return routes::targets::get(state, req, &id).await;
        }
        if let Some(id) = last_segment(path, "/api/submissions/") {
            return routes::submissions::get(state, req, &id).await;
        }
    } else if method == Method::POST {
        match path {
            "/api/submissions" => return routes::submissions::create(state, req).await,
            "/api/role-requests" => return routes::role_requests::create(state, req).await,
            "/api/targets" => return routes::targets::create(state, req).await,
            "/api/posts" => return routes::posts::create(state, req).await,
            "/api/dev/token" => return routes::dev::token(state, req).await,
            _ => {}
        }
        if let Some(id) = segment_between(path, "/api/posts/", "/like") {
            return routes::posts::like(state, req, &id).await;
        }
        if let Some(id) = segment_between(path, "/api/posts/", "/comments") {
            return routes::posts::comment(state, req, &id).await;
        }
    } else if method == Method::PUT {
        if let Some(id) = segment_between(path, "/api/submissions/", "/review") {
            return routes::submissions::review(state, req, &id).await;
        }
        if let Some(id) = segment_between(path, "/api/role-requests/", "/approve") {
            return routes::role_requests::approve(state, req, &id).await;
        }
        if let Some(id) = segment_between(path, "/api/role-requests/", "/reject") {
            return routes::role_requests::reject(state, req, &id).await;
        }
        if let Some(id) = segment_between(path, "/api/notifications/", "/read") {
            return routes::notifications::mark_read(state, req, &id).await;
        }
    }

    Err(GreenwayError::NotFound(format!("No route for {}", path)))
}

/// Extract the single path segment between a prefix and a suffix,
/// e.g. `/api/submissions/{id}/review`
fn segment_between(path: &str, prefix: &str, suffix: &str) -> Option<String> {
    let rest = path.strip_prefix(prefix)?;
    let id = rest.strip_suffix(suffix)?;
    if id.is_empty() || id.contains('/') {
        return None;
    }
    Some(id.to_string())
}

/// Extract the final path segment after a prefix, e.g. `/media/{name}`
fn last_segment(path: &str, prefix: &str) -> Option<String> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.contains('/') {
        return None;
    }
    Some(rest.to_string())
}

fn apply_cors(response: &mut HttpResponse) {
    response.headers_mut().insert(
        "Access-Control-Allow-Origin",
        hyper::header::HeaderValue::from_static("*"),
    );
}

/// CORS preflight response
fn preflight_response() -> HttpResponse {
    let mut response = hyper::Response::new(http_body_util::Full::new(bytes::Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    let headers = response.headers_mut();
    for (name, value) in [
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Headers", "*"),
        ("Access-Control-Allow-Methods", "GET, POST, PUT, OPTIONS"),
    ] {
        headers.insert(name, hyper::header::HeaderValue::from_static(value));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_between_extracts_single_ids() {
        assert_eq!(
            segment_between("/api/submissions/abc123/review", "/api/submissions/", "/review"),
            Some("abc123".to_string())
        );
        assert_eq!(
            segment_between("/api/submissions//review", "/api/submissions/", "/review"),
            None
        );
        assert_eq!(
            segment_between("/api/submissions/a/b/review", "/api/submissions/", "/review"),
            None
        );
    }

    #[test]
    fn last_segment_refuses_nested_paths() {
        assert_eq!(
            last_segment("/media/abc.jpg", "/media/"),
            Some("abc.jpg".to_string())
        );
        assert_eq!(last_segment("/media/a/b.jpg", "/media/"), None);
        assert_eq!(last_segment("/media/", "/media/"), None);
    }
}
