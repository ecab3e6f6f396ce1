// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! Server-level failures and their HTTP mapping. Tool failures never show up here: the
//! registry turns them into `isError` outcomes that are served with status 200.

use std::net::SocketAddr;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Error types for server operations
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Network binding errors
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        /// Socket address that failed to bind
        address: SocketAddr,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server startup errors
    #[error("Server startup failed: {source}")]
    Startup {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server shutdown errors
    #[error("Server shutdown failed: {source}")]
    Shutdown {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// JSON parsing errors with detailed context
    #[error("Invalid JSON request: {message}")]
    JsonError {
        /// Detailed error message
        message: String,
    },

    /// The requested tool does not exist
    #[error("Unknown tool: {name}")]
    UnknownTool {
        /// Name from the request path
        name: String,
    },
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// HTTP status this error is served with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Config { .. }
            | Self::Bind { .. }
            | Self::Startup { .. }
            | Self::Shutdown { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::JsonError { .. } => StatusCode::BAD_REQUEST,
            Self::UnknownTool { .. } => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));
        (status, body).into_response()
    }
}

impl From<explorer_tools::UnknownToolName> for ServerError {
    fn from(error: explorer_tools::UnknownToolName) -> Self {
        Self::UnknownTool { name: error.0 }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            ServerError::UnknownTool {
                name: "mint".to_string()
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::JsonError {
                message: "bad".to_string()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::Config {
                message: "x".to_string()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn json_body() {
        let response = ServerError::from(explorer_tools::UnknownToolName("mint".to_string()))
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Unknown tool: mint");
        assert_eq!(json["status"], 404);
    }
}
