//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Invalid listen address.
    #[error("Invalid address: {0}")]
    Address(#[from] std::net::AddrParseError),

    /// Blocking request task failed.
    #[error("Request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(json!({"error": self.to_string()})),
        )
            .into_response()
    }
}
