//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sitegate_metadata::MetadataError;
use sitegate_tenancy::TenancyError;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("core error: {0}")]
    Core(#[from] sitegate_core::Error),

    #[error("domain resolution error: {0}")]
    Tenancy(#[from] TenancyError),
}

fn metadata_status(e: &MetadataError) -> StatusCode {
    match e {
        MetadataError::NotFound(_) => StatusCode::NOT_FOUND,
        MetadataError::AlreadyExists(_) => StatusCode::CONFLICT,
        MetadataError::Constraint(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal_error",
            Self::Metadata(_) => "metadata_error",
            Self::Core(_) => "core_error",
            Self::Tenancy(TenancyError::Metadata(_)) => "metadata_error",
            Self::Tenancy(TenancyError::Core(_)) => "core_error",
            Self::Tenancy(TenancyError::NotInitialized) => "domains_not_initialized",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Metadata(e) => metadata_status(e),
            Self::Core(_) => StatusCode::BAD_REQUEST,
            Self::Tenancy(e) => match e {
                TenancyError::Metadata(e) => metadata_status(e),
                // Stored rows failing to hydrate is a server-side problem.
                TenancyError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
                TenancyError::NotInitialized => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
