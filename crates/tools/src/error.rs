// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Tool failures

use api_client::ApiError;
use external_apis::InvalidResourceId;
use thiserror::Error;

/// Errors raised while running a tool
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments failed to parse or violate a constraint
    #[error("invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the arguments
        message: String,
    },

    /// The upstream explorer call failed
    #[error(transparent)]
    Upstream(#[from] ApiError),

    /// The output record could not be rendered as JSON
    #[error("failed to serialize tool output: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for tool runs
pub type ToolResult<T> = Result<T, ToolError>;

impl ToolError {
    /// Invalid argument error with the given message
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Short label for metrics and logs
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::Upstream(error) => error.kind(),
            Self::Serialization(_) => "serialization",
        }
    }
}

impl From<InvalidResourceId> for ToolError {
    fn from(error: InvalidResourceId) -> Self {
        Self::invalid(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_upstream_errors() {
        let error = ToolError::from(ApiError::RateExceeded {
            key: "global".to_string(),
            retry_after_ms: 10,
        });
        assert_eq!(error.kind(), "rate_exceeded");
        assert_eq!(ToolError::invalid("bad").kind(), "invalid_input");
    }

    #[test]
    fn resource_id_errors_are_invalid_input() {
        let error: ToolError = external_apis::ResourceId::new("  ").unwrap_err().into();
        assert!(matches!(error, ToolError::InvalidInput { .. }));
    }
}
