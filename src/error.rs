//! API error taxonomy shared by the step controller and route handlers
//!
//! Every user-visible failure carries a machine-readable kind plus a
//! human-readable message. Internal details are logged, not leaked.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    InvalidInput(String),

    #[error("invalid or missing credential")]
    Unauthorized,

    #[error("session state is corrupt: {0}")]
    StateCorrupt(String),

    #[error("session is busy with another step")]
    SessionBusy,

    #[error("research engine call failed: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Machine-readable error kind for JSON bodies
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::Unauthorized => "unauthorized",
            ApiError::StateCorrupt(_) => "state_corrupt",
            ApiError::SessionBusy => "session_busy",
            ApiError::Upstream(_) => "upstream_failure",
            ApiError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::StateCorrupt(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::SessionBusy => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Internal errors keep their detail out of the response body
        let message = match &self {
            ApiError::Internal(detail) => {
                log::error!("internal error: {}", detail);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": self.kind(),
            "message": message,
        }));

        (self.status(), body).into_response()
    }
}
