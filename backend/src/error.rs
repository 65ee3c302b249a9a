//! Error handling for the Warehouse Stock Ledger
//!
//! Every error leaves the server in the standard `{success, message}` envelope
//! with a machine-readable `code`.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::ValidationError;
use thiserror::Error;
use uuid::Uuid;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Too many requests")]
    RateLimited,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Insufficient stock for item {item_id}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: Uuid,
        available: i64,
        requested: i64,
    },

    #[error("Document number already exists: {0}")]
    DuplicateDocument(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Infrastructure errors
    #[error("Timed out waiting for stock lock")]
    LockTimeout,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Seconds a client is told to wait before retrying a transient failure
const RETRY_AFTER_SECS: &str = "1";

impl AppError {
    /// Whether the same request may succeed if simply retried. Such
    /// responses carry a `Retry-After` header.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::LockTimeout | AppError::RateLimited)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InsufficientStock { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DuplicateDocument(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::LockTimeout | AppError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::RateLimited => "RATE_LIMITED",
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            AppError::DuplicateDocument(_) => "DUPLICATE_DOCUMENT",
            AppError::Conflict(_) => "CONFLICT",
            AppError::LockTimeout => "LOCK_TIMEOUT",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::RateLimited => "Too many requests, please slow down".to_string(),
            AppError::Validation { message, .. } => message.clone(),
            AppError::NotFound(resource) => format!("{} not found", resource),
            AppError::InsufficientStock {
                item_id,
                available,
                requested,
            } => format!(
                "Insufficient stock for item {}. Available: {}, requested: {}",
                item_id, available, requested
            ),
            AppError::DuplicateDocument(number) => {
                format!("Document number {} already exists, please retry", number)
            }
            AppError::Conflict(msg) => msg.clone(),
            AppError::LockTimeout => {
                "The item is busy with another transaction, please retry".to_string()
            }
            AppError::Storage(_) | AppError::DatabaseError(_) => {
                "Failed to process the request".to_string()
            }
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation {
            field: err.field(),
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation {
            field: "body".to_string(),
            message: format!("Invalid request body: {}", rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation {
            field: "query".to_string(),
            message: format!("Invalid query parameters: {}", rejection.body_text()),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation {
            field: "path".to_string(),
            message: format!("Invalid path parameter: {}", rejection.body_text()),
        }
    }
}

/// Error response envelope
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            code: code.to_string(),
            field: None,
            data: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = ErrorResponse::new(self.code(), self.public_message());

        match &self {
            AppError::Validation { field, .. } => body.field = Some(field.clone()),
            AppError::InsufficientStock {
                item_id,
                available,
                requested,
            } => {
                body.data = Some(serde_json::json!({
                    "item_id": item_id,
                    "available": available,
                    "requested": requested,
                }));
            }
            _ => {}
        }

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let mut response = (status, Json(body)).into_response();
        if self.is_retryable() {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
        }
        response
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
