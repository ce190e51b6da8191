/// Unified error types for the Chlu Query gateway
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the gateway and its storage collaborator
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Relational index errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Errors talking to the IPFS API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Content that is not valid JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Content could not be retrieved from storage
    #[error("Storage error: {0}")]
    Storage(String),

    /// A review record failed validation and errors were requested to be thrown
    #[error("Validation error: {0}")]
    Validation(String),

    /// The mutable pointer chain of a review record is broken
    #[error("Version chain error: {0}")]
    VersionChain(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Message used when a failure carries no usable description
pub const UNKNOWN_ERROR: &str = "Unknown Error";

/// Error body returned by every route: `{"message": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failures outside the resolution contract are always a 500
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        tracing::error!("Request failed: {}", self);

        let message = self.client_message();
        (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { message })).into_response()
    }
}

impl GatewayError {
    /// Terse message safe to show to any caller
    pub fn client_message(&self) -> String {
        match self {
            // Don't leak connection strings or query details
            GatewayError::Database(_)
            | GatewayError::Http(_)
            | GatewayError::Io(_)
            | GatewayError::Internal(_) => {
                UNKNOWN_ERROR.to_string()
            }
            other => {
                let message = other.to_string();
                if message.is_empty() {
                    UNKNOWN_ERROR.to_string()
                } else {
                    message
                }
            }
        }
    }
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
