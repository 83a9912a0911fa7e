//! Hub error types with HTTP status code mapping.
//!
//! [`HubError`] is the central error type. Each variant maps to a numeric
//! code, an HTTP status and a structured JSON error response. Provider soft
//! failures never reach this type; see [`crate::location::ProviderError`].

use axum::extract::rejection::PathRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::DisasterId;
use crate::persistence::StorageError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2101,
///     "message": "forbidden: not authorized to update this disaster",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`HubError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category              | HTTP Status                 |
/// |-----------|-----------------------|-----------------------------|
/// | 1000–1999 | Validation            | 400 Bad Request             |
/// | 2000–2099 | Not Found             | 404 Not Found               |
/// | 2100–2199 | Access                | 401 Unauthorized / 403 Forbidden |
/// | 3000–3999 | Server / Storage      | 500 / 503                   |
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// Missing or invalid required fields. Never retried.
    #[error("invalid request: {0}")]
    Validation(String),

    /// No disaster with the given id.
    #[error("disaster not found: {0}")]
    NotFound(DisasterId),

    /// The acting user may not perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The caller token did not resolve to a user.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The storage backend failed. Surfaced verbatim, not retried.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HubError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::NotFound(_) => 2001,
            Self::Forbidden(_) => 2101,
            Self::Unauthorized(_) => 2102,
            Self::StorageUnavailable(_) => 3001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PathRejection> for HubError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<StorageError> for HubError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Corrupt(_) => Self::Internal(err.to_string()),
            _ => Self::StorageUnavailable(err.to_string()),
        }
    }
}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
