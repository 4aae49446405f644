//! Community feed routes

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bson::DateTime;
use hyper::body::Incoming;
use hyper::{Request, StatusCode};
use serde::{Deserialize, Serialize};

use crate::db::schemas::{Comment, PostDoc};
use crate::routes::{authenticate, json_response, opt_rfc3339, parse_json_body, rfc3339, HttpResponse};
use crate::server::AppState;
use crate::types::{GreenwayError, Result};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    pub created_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub likes: Vec<String>,
    pub comments: Vec<CommentView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl From<&PostDoc> for PostView {
    fn from(post: &PostDoc) -> Self {
        Self {
            id: post._id.map(|o| o.to_hex()).unwrap_or_default(),
            author_id: post.author_id.clone(),
            author_name: post.author_name.clone(),
            text: post.text.clone(),
            photo_url: post.photo_url.clone(),
            likes: post.likes.clone(),
            comments: post
                .comments
                .iter()
                .map(|c| CommentView {
                    author_id: c.author_id.clone(),
                    author_name: c.author_name.clone(),
                    text: c.text.clone(),
                    created_at: rfc3339(c.created_at),
                })
                .collect(),
            created_at: opt_rfc3339(post.metadata.created_at),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePostRequest {
    text: String,
    photo_base64: Option<String>,
    content_type: Option<String>,
}

/// POST /api/posts
pub async fn create(state: &AppState, req: Request<Incoming>) -> Result<HttpResponse> {
    let principal = authenticate(state, req.headers()).await?;

    let limit = state.args.max_proof_bytes * 2;
    let body: CreatePostRequest = parse_json_body(req, limit).await?;

    if body.text.trim().is_empty() {
        return Err(GreenwayError::Validation("Post text is required".into()));
    }

    let photo_url = match body.photo_base64 {
        Some(encoded) => {
            let bytes = BASE64
                .decode(encoded.trim())
                .map_err(|e| GreenwayError::Validation(format!("Invalid photo encoding: {}", e)))?;
            if bytes.len() > state.args.max_proof_bytes {
                return Err(GreenwayError::Validation("Photo too large".into()));
            }
            let content_type = body.content_type.as_deref().unwrap_or("image/jpeg");
            Some(state.objects.put(&bytes, content_type).await?)
        }
        None => None,
    };

    let post = state
        .feed
        .create_post(PostDoc::new(
            principal.account_id,
            principal.display_name,
            body.text.trim().to_string(),
            photo_url,
        ))
        .await?;

    json_response(StatusCode::CREATED, &PostView::from(&post))
}

/// GET /api/posts
pub async fn list(state: &AppState, req: Request<Incoming>) -> Result<HttpResponse> {
    authenticate(state, req.headers()).await?;

    let posts = state.feed.list_posts().await?;
    let views: Vec<PostView> = posts.iter().map(PostView::from).collect();
    json_response(StatusCode::OK, &views)
}

/// POST /api/posts/{id}/like
pub async fn like(state: &AppState, req: Request<Incoming>, id: &str) -> Result<HttpResponse> {
    let principal = authenticate(state, req.headers()).await?;

    let post = state
        .feed
        .toggle_like(id, &principal.account_id)
        .await?
        .ok_or_else(|| GreenwayError::NotFound("Post not found".into()))?;

    json_response(StatusCode::OK, &PostView::from(&post))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentRequest {
    text: String,
}

/// POST /api/posts/{id}/comments
pub async fn comment(state: &AppState, req: Request<Incoming>, id: &str) -> Result<HttpResponse> {
    let principal = authenticate(state, req.headers()).await?;

    let body: CommentRequest = parse_json_body(req, 64 * 1024).await?;
    if body.text.trim().is_empty() {
        return Err(GreenwayError::Validation("Comment text is required".into()));
    }

    let post = state
        .feed
        .add_comment(
            id,
            Comment {
                author_id: principal.account_id,
                author_name: principal.display_name,
                text: body.text.trim().to_string(),
                created_at: DateTime::now(),
            },
        )
        .await?
        .ok_or_else(|| GreenwayError::NotFound("Post not found".into()))?;

    json_response(StatusCode::CREATED, &PostView::from(&post))
}
