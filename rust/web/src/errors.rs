//! JSON error bodies and the mapping from crate errors to HTTP statuses.

use crate::room::RoomError;
use serde::{Deserialize, Serialize};
use std::fmt;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::Reply;

/// Body of every non-2xx API response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Stable code such as `room_not_found`.
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(error, message)
        }
    }

    pub fn into_response(self, status: StatusCode) -> Response {
        reply::with_status(reply::json(&self), status).into_response()
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Picks the level an error is logged at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Bad input from the caller; logged at info.
    Client,
    Server,
    /// Shared state is unusable, e.g. a poisoned lock.
    Critical,
}

/// Maps an error onto an HTTP status and an [`ErrorResponse`] body.
pub trait IntoErrorResponse {
    fn status_code(&self) -> StatusCode;

    fn error_code(&self) -> &'static str;

    fn error_message(&self) -> String;

    fn error_details(&self) -> Option<serde_json::Value> {
        None
    }

    /// Defaults to [`ErrorSeverity::Server`] for 5xx statuses.
    fn severity(&self) -> ErrorSeverity {
        if self.status_code().is_server_error() {
            ErrorSeverity::Server
        } else {
            ErrorSeverity::Client
        }
    }

    fn to_error_response(&self) -> ErrorResponse {
        match self.error_details() {
            Some(details) => {
                ErrorResponse::with_details(self.error_code(), self.error_message(), details)
            }
            None => ErrorResponse::new(self.error_code(), self.error_message()),
        }
    }

    /// Logs the error at its severity and renders the response.
    fn into_http_response(self) -> Response
    where
        Self: Sized,
    {
        let status = self.status_code();
        let body = self.to_error_response();
        log_error(self.severity(), status, &body);
        body.into_response(status)
    }
}

fn log_error(severity: ErrorSeverity, status: StatusCode, body: &ErrorResponse) {
    let status = status.as_u16();
    match severity {
        ErrorSeverity::Client => {
            tracing::info!(status, error = %body.error, message = %body.message, "request rejected")
        }
        ErrorSeverity::Server => {
            tracing::error!(status, error = %body.error, message = %body.message, "request failed")
        }
        ErrorSeverity::Critical => tracing::error!(
            status,
            error = %body.error,
            message = %body.message,
            critical = true,
            "request failed"
        ),
    }
}

impl IntoErrorResponse for RoomError {
    fn status_code(&self) -> StatusCode {
        match self {
            RoomError::Closed(_) => StatusCode::GONE,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RoomError::Closed(_) => "room_closed",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }
}
