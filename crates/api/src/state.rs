// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server state management module
//!
//! Shared application state: configuration, the tool registry and the cancellation token
//! used for coordinated shutdown.

use std::sync::Arc;

use api_client::{CacheStats, HealthCheckResult};
use explorer_tools::ToolRegistry;
use serde::Serialize;
use shared_types::Network;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::config::{Environment, ServerConfig};

/// Shared application state with cancellation token support
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Server configuration
    config: Arc<ServerConfig>,
    /// Explorer tools over the upstream pipeline
    registry: Arc<ToolRegistry>,
    /// Cancellation token for coordinated shutdown
    pub cancellation_token: CancellationToken,
}

impl ServerState {
    /// Create new server state
    pub fn new(
        config: ServerConfig,
        registry: Arc<ToolRegistry>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            config: Arc::new(config),
            registry,
            cancellation_token,
        }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Tool registry
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Statistics of the upstream response cache
    pub fn cache_stats(&self) -> CacheStats {
        self.registry.context().client.pipeline().cache().stats()
    }

    /// Liveness report; does not contact upstream
    pub fn health_check(&self) -> HealthCheck {
        HealthCheck {
            status: "up",
            version: env!("CARGO_PKG_VERSION"),
            environment: self.config.environment,
            network: self.config.network,
            upstream: self.config.upstream_url().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            cache: self.cache_stats(),
        }
    }

    /// Probe the upstream explorer
    pub async fn upstream_health(&self) -> UpstreamHealth {
        let probe = self.registry.context().client.health_check().await;
        UpstreamHealth {
            network: self.config.network,
            upstream: self.config.upstream_url().to_string(),
            probe,
        }
    }
}

/// Health check status
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthCheck {
    /// Always `up` while the process serves requests
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
    /// Environment
    #[schema(value_type = String, example = "production")]
    pub environment: Environment,
    /// Network the tools read from
    pub network: Network,
    /// Upstream explorer API
    pub upstream: String,
    /// Timestamp
    pub timestamp: String,
    /// Upstream response cache
    #[schema(value_type = Object)]
    pub cache: CacheStats,
}

/// Upstream probe report
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UpstreamHealth {
    /// Network the tools read from
    pub network: Network,
    /// Upstream explorer API
    pub upstream: String,
    /// Probe outcome
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub probe: HealthCheckResult,
}
