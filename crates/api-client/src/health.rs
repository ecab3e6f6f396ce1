// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Upstream health reporting

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Health status of an upstream API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum HealthStatus {
    /// Upstream answered the probe
    Up,
    /// Upstream is reachable but throttling us
    Degraded { reason: String },
    /// Upstream is unusable
    Down { reason: String },
}

impl HealthStatus {
    /// Classify a failed probe
    ///
    /// Throttling, local or remote, is degraded; everything else is down.
    pub fn from_error(error: &ApiError) -> Self {
        let reason = error.to_string();
        match error {
            ApiError::RateExceeded { .. } | ApiError::UpstreamHttp { status: 429, .. } => {
                Self::Degraded { reason }
            }
            _ => Self::Down { reason },
        }
    }

    /// Whether requests can still be served
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Up | Self::Degraded { .. })
    }

    /// Human-readable description
    pub fn description(&self) -> &str {
        match self {
            Self::Up => "Upstream is healthy",
            Self::Degraded { reason } | Self::Down { reason } => reason,
        }
    }
}

/// Outcome of one probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Probe status
    #[serde(flatten)]
    pub status: HealthStatus,
    /// Time spent on the probe, in milliseconds
    pub response_time_ms: u64,
    /// When the probe completed
    pub checked_at: DateTime<Utc>,
}

impl HealthCheckResult {
    /// Record a probe outcome that took `response_time`
    pub fn new(status: HealthStatus, response_time: Duration) -> Self {
        Self {
            status,
            response_time_ms: u64::try_from(response_time.as_millis()).unwrap_or(u64::MAX),
            checked_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttling_is_degraded() {
        let status = HealthStatus::from_error(&ApiError::RateExceeded {
            key: "global".to_string(),
            retry_after_ms: 100,
        });
        assert!(matches!(status, HealthStatus::Degraded { .. }));
        assert!(status.is_available());

        let status = HealthStatus::from_error(&ApiError::UpstreamHttp {
            status: 429,
            body: String::new(),
        });
        assert!(matches!(status, HealthStatus::Degraded { .. }));
    }

    #[test]
    fn other_failures_are_down() {
        let status = HealthStatus::from_error(&ApiError::Transport {
            message: "connection refused".to_string(),
        });
        assert!(!status.is_available());
        assert!(status.description().contains("connection refused"));
    }

    #[test]
    fn result_serializes_flat() {
        let result = HealthCheckResult::new(HealthStatus::Up, Duration::from_millis(12));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "up");
        assert_eq!(json["response_time_ms"], 12);
    }
}
