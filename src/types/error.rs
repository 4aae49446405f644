//! Error types for Greenway
//!
//! One enum covers the whole service. Ledger conflicts get their own
//! variants because the UI needs a specific reason code to explain the
//! refused transition; they all map to 409.

use hyper::StatusCode;

/// Main error type for Greenway operations
#[derive(Debug, thiserror::Error)]
pub enum GreenwayError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("A submission for this target is already pending review")]
    DuplicateSubmission,

    #[error("This target has already been completed")]
    AlreadyCompleted,

    #[error("Submission has already been reviewed")]
    AlreadyReviewed,

    #[error("A role request is already pending for this account")]
    AlreadyPending,

    #[error("No pending role request for this account")]
    NoPendingRequest,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Object store error: {0}")]
    ObjectStore(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),
}

impl GreenwayError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateSubmission
            | Self::AlreadyCompleted
            | Self::AlreadyReviewed
            | Self::AlreadyPending
            | Self::NoPendingRequest => StatusCode::CONFLICT,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::ObjectStore(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Machine-readable reason code surfaced in the error body
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::DuplicateSubmission => "DUPLICATE_SUBMISSION",
            Self::AlreadyCompleted => "ALREADY_COMPLETED",
            Self::AlreadyReviewed => "ALREADY_REVIEWED",
            Self::AlreadyPending => "ALREADY_PENDING",
            Self::NoPendingRequest => "NO_PENDING_REQUEST",
            Self::Database(_) => "DB_ERROR",
            Self::ObjectStore(_) => "OBJECT_STORE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Auth(_) => "AUTH_ERROR",
        }
    }
}

// Implement From conversions for common error types

impl From<std::io::Error> for GreenwayError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for GreenwayError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for GreenwayError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for GreenwayError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for GreenwayError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Unauthorized(format!("JWT error: {}", err))
    }
}

/// Result type alias for Greenway operations
pub type Result<T> = std::result::Result<T, GreenwayError>;
