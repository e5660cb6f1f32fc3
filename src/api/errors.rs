//! API Error Handling
//!
//! Errors are returned to callers as plain text with a 400 or 500 status.
//! The request id is kept for the log line only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;
use tracing::warn;

/// API error with request tracking
#[derive(Debug)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub request_id: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Missing or empty request parameter
    Validation(String),
    /// Upstream or calculation failure
    InternalError(String),
}

impl ApiError {
    pub fn validation(request_id: String, message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Validation(message.into()),
            request_id,
        }
    }

    pub fn internal_error(request_id: String, message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::InternalError(message.into()),
            request_id,
        }
    }

    pub fn status(&self) -> StatusCode {
        match &self.kind {
            ApiErrorKind::Validation(_) => StatusCode::BAD_REQUEST,
            ApiErrorKind::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match &self.kind {
            ApiErrorKind::Validation(msg) | ApiErrorKind::InternalError(msg) => msg,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ApiErrorKind::Validation(msg) => write!(f, "[{}] Bad Request: {}", self.request_id, msg),
            ApiErrorKind::InternalError(msg) => write!(f, "[{}] Internal Error: {}", self.request_id, msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!("{}", self);
        let status = self.status();
        let body = match self.kind {
            ApiErrorKind::Validation(msg) | ApiErrorKind::InternalError(msg) => msg,
        };

        (status, body).into_response()
    }
}
