// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for upstream requests

use thiserror::Error;

/// Errors raised while calling an upstream API
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Upstream answered with a non-success status code
    #[error("upstream request failed ({status}): {body}")]
    UpstreamHttp {
        /// HTTP status code returned by upstream
        status: u16,
        /// Response body text, possibly empty
        body: String,
    },

    /// Upstream payload was not JSON or did not match the expected shape
    #[error("upstream response has an unexpected shape: {message}")]
    UpstreamShape {
        /// Validation failure description
        message: String,
    },

    /// The outbound rate limit window is exhausted
    #[error("rate limit exceeded while calling upstream (key: {key}, retry after {retry_after_ms} ms)")]
    RateExceeded {
        /// Rate limiter key that was denied
        key: String,
        /// Time until the current window resets
        retry_after_ms: u64,
    },

    /// Connection, DNS, TLS or timeout failure before a response was received
    #[error("transport error: {message}")]
    Transport {
        /// Underlying transport failure
        message: String,
    },

    /// The pipeline could not be constructed or a request could not be built
    #[error("configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },
}

/// Result type for upstream operations
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Whether the failure is transient and worth another attempt
    ///
    /// Only transport failures and non-success statuses are retried. Shape failures are
    /// deterministic and rate limit denials must not consume further permits.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::UpstreamHttp { .. })
    }

    /// Short label suitable for metrics and structured logs
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UpstreamHttp { .. } => "upstream_http",
            Self::UpstreamShape { .. } => "upstream_shape",
            Self::RateExceeded { .. } => "rate_exceeded",
            Self::Transport { .. } => "transport",
            Self::Configuration { .. } => "configuration",
        }
    }

    /// HTTP status code returned by upstream, if any
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::UpstreamHttp { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            return Self::UpstreamShape {
                message: error.to_string(),
            };
        }

        if error.is_builder() {
            return Self::Configuration {
                message: error.to_string(),
            };
        }

        Self::Transport {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        Self::UpstreamShape {
            message: error.to_string(),
        }
    }
}
