// src/error.rs
//! Error taxonomy shared by the engines, the HTTP triggers, and the bins.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Referenced task/record absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed or missing required input fields.
    #[error("invalid input: {0}")]
    Validation(String),

    /// External data source returned a non-success status or no usable data.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Persistence read/write failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn status(&self) -> StatusCode {
        match self {
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::Upstream(_) => StatusCode::BAD_GATEWAY,
            EngineError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
