//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent JSON error response format across all
//! endpoints. Infrastructure faults collapse to an opaque 500; their detail
//! is logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use smartops_action::{ActionError, SchedulerError};
use smartops_core::error::SmartOpsError;

/// Message returned for every internal fault.
pub const INTERNAL_ERROR_MESSAGE: &str = "The request could not be processed. Please try again later.";

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional structured details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 404 Not Found - resource does not exist.
    NotFound(String),
    /// 409 Conflict - a scheduled job already holds this identity.
    Conflict(String),
    /// 500 Internal Server Error - detail stays in the logs.
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                INTERNAL_ERROR_MESSAGE.to_string(),
            ),
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ActionError> for ApiError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::EmptyCommand
            | ActionError::CommandTooLong(_)
            | ActionError::InvalidPayload(_) => ApiError::BadRequest(err.to_string()),
            ActionError::UnknownTool(_) => ApiError::NotFound(err.to_string()),
            ActionError::Scheduler(ref e) => match e {
                SchedulerError::NotFound(_) => ApiError::NotFound(err.to_string()),
                SchedulerError::Conflict(_) => ApiError::Conflict(err.to_string()),
                SchedulerError::InvalidTime(_) | SchedulerError::MissingTime => {
                    ApiError::BadRequest(err.to_string())
                }
            },
            // Already logged by the orchestrator.
            ActionError::ExecutorFailed(_)
            | ActionError::Timeout(_)
            | ActionError::Classifier(_)
            | ActionError::Storage(_) => ApiError::Internal,
        }
    }
}

impl From<SmartOpsError> for ApiError {
    fn from(err: SmartOpsError) -> Self {
        tracing::error!(error = %err, "Request failed");
        ApiError::Internal
    }
}
