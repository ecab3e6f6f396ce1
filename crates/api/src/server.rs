// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server implementation module
//!
//! Builds the upstream request pipeline and tool registry from configuration, wires the
//! router and its middleware, and runs the server with coordinated graceful shutdown
//! using `CancellationToken`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use api_client::{PipelineConfig, RateLimiter, RequestPipeline, ResponseCache};
use axum::{Router, http::HeaderName};
use explorer_tools::ToolRegistry;
use external_apis::{BlockscoutClient, default_routers, load_router_overrides, merge_routers};
use hyper::Request;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, warn};

use crate::{
    config::ServerConfig,
    error::{ServerError, ServerResult},
    routes::create_routes,
    state::ServerState,
};

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
const DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS: u64 = 30;

/// Configuration for server shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Time in-flight requests get to finish once shutdown starts
    pub graceful_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            graceful_timeout: Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS),
        }
    }
}

/// Main server struct
#[derive(Debug)]
pub struct Server {
    /// Server configuration
    config: ServerConfig,
    /// Application router
    router: Router,
    /// Server state
    state: ServerState,
    /// Cancellation token for coordinated shutdown
    cancellation_token: CancellationToken,
    /// Configuration for coordinated shutdown
    graceful_shutdown_config: ShutdownConfig,
}

impl Server {
    /// Create new server instance
    ///
    /// Reads the router override file when one is configured.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the configuration is invalid, the upstream client
    /// cannot be built or the router override file is unreadable.
    pub async fn new(config: ServerConfig, shutdown_config: ShutdownConfig) -> ServerResult<Self> {
        let registry = Self::create_registry_from_config(&config).await?;
        Self::with_registry(config, shutdown_config, Arc::new(registry))
    }

    /// Build the request pipeline, explorer client and tool registry
    async fn create_registry_from_config(config: &ServerConfig) -> ServerResult<ToolRegistry> {
        config.validate().map_err(|e| ServerError::Config {
            message: e.to_string(),
        })?;

        let pipeline_config = PipelineConfig::new(config.upstream_url().as_str())
            .map(|pipeline| {
                pipeline
                    .with_api_key(config.blockscout.api_key.clone())
                    .with_retry(config.retry.policy())
            })
            .map_err(|e| ServerError::Config {
                message: e.to_string(),
            })?;

        let cache = Arc::new(ResponseCache::new(
            config.cache.ttl(),
            config.cache.max_entries,
        ));
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.quota()));
        let pipeline = RequestPipeline::new(pipeline_config, cache, rate_limiter).map_err(|e| {
            ServerError::Config {
                message: e.to_string(),
            }
        })?;

        let overrides = match &config.routers_config_path {
            Some(path) => load_router_overrides(path)
                .await
                .map_err(|e| ServerError::Config {
                    message: e.to_string(),
                })?,
            None => None,
        };
        let routers = merge_routers(&default_routers(), overrides.as_ref());

        info!(
            network = %config.network,
            upstream = %config.upstream_url(),
            routers = routers.len(),
            "explorer client configured"
        );

        Ok(ToolRegistry::new(
            BlockscoutClient::new(pipeline, config.network),
            routers,
        ))
    }

    /// Create server over an existing registry
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the configuration is invalid.
    pub fn with_registry(
        config: ServerConfig,
        graceful_shutdown_config: ShutdownConfig,
        registry: Arc<ToolRegistry>,
    ) -> ServerResult<Self> {
        let cancellation_token = CancellationToken::new();
        let state = ServerState::new(config.clone(), registry, cancellation_token.child_token());
        let router = Self::create_router(state.clone());

        Ok(Self {
            config,
            router,
            state,
            cancellation_token,
            graceful_shutdown_config,
        })
    }

    /// Create application router with middleware
    fn create_router(state: ServerState) -> Router {
        let timeout = state.config().timeout_seconds.value();

        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                let request_id = req
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("unknown");
                info_span!(
                    "http_request",
                    request_id,
                    method = %req.method(),
                    uri = %req.uri()
                )
            }))
            .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
            .layer(CorsLayer::permissive())
            .layer(TimeoutLayer::new(timeout));

        create_routes().layer(middleware).with_state(state)
    }

    /// Bind the configured address
    async fn bind(&self) -> ServerResult<(TcpListener, SocketAddr)> {
        let address = self.config.socket_addr();
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| ServerError::Bind { address, source })?;
        let bound = listener
            .local_addr()
            .map_err(|source| ServerError::Startup { source })?;
        Ok((listener, bound))
    }

    /// Run the server until SIGINT, SIGTERM or [`Server::shutdown`]
    ///
    /// In-flight requests get `graceful_timeout` to finish once shutdown starts.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address,
    /// `ServerError::Startup` if the server fails to start, or `ServerError::Shutdown`
    /// if serving fails.
    pub async fn run(self) -> ServerResult<()> {
        let (listener, address) = self.bind().await?;
        info!(
            %address,
            environment = %self.config.environment,
            network = %self.config.network,
            "explorer tools server starting",
        );

        tokio::spawn(cancel_on_signal(self.cancellation_token.clone()));

        let token = self.cancellation_token.clone();
        let serving = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .into_future();
        tokio::pin!(serving);

        let result = tokio::select! {
            result = &mut serving => result,
            () = self.cancellation_token.cancelled() => {
                let drain = self.graceful_shutdown_config.graceful_timeout;
                match tokio::time::timeout(drain, &mut serving).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(
                            timeout_seconds = drain.as_secs(),
                            "graceful shutdown timed out, dropping open connections"
                        );
                        Ok(())
                    }
                }
            }
        };

        result.map_err(|source| {
            error!(error = %source, "server error during shutdown");
            ServerError::Shutdown { source }
        })?;
        info!("explorer tools server stopped");
        Ok(())
    }

    /// Returns a clone of the cancellation token for coordinated shutdown
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Start shutting down
    pub fn shutdown(&self) {
        info!("programmatic shutdown requested");
        self.cancellation_token.cancel();
    }

    /// Serve in the background on the configured address
    ///
    /// Returns the bound address and a token that stops the server when cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address.
    pub async fn run_for_testing(self) -> ServerResult<(SocketAddr, CancellationToken)> {
        let (listener, address) = self.bind().await?;

        let token = self.cancellation_token.child_token();
        let stop = token.clone();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, self.router)
                .with_graceful_shutdown(async move { stop.cancelled().await })
                .await
            {
                error!(error = %e, "test server failed");
            }
        });

        Ok((address, token))
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get server state for testing
    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Shutdown timeouts
    pub fn shutdown_config(&self) -> &ShutdownConfig {
        &self.graceful_shutdown_config
    }
}

/// Cancel `token` on the first SIGINT or SIGTERM, or return once it is cancelled elsewhere
async fn cancel_on_signal(token: CancellationToken) {
    tokio::select! {
        received = shutdown_signal() => match received {
            Ok(signal) => {
                warn!(signal, "shutdown signal received, cancelling all operations");
                token.cancel();
            }
            Err(e) => error!(error = %e, "failed to listen for shutdown signals"),
        },
        () = token.cancelled() => {}
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = terminate.recv() => Ok("SIGTERM"),
        _ = interrupt.recv() => Ok("SIGINT"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("CTRL+C")
}
