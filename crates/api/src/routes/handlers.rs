// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP request handlers module
//!
//! Health reports, the tool listing, tool invocation and the router directory.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use explorer_tools::{INSTRUCTIONS, ToolDescriptor, ToolName, ToolOutcome};
use serde::Serialize;
use shared_types::Network;
use tracing::debug;
use utoipa::ToSchema;

use crate::{
    error::ServerError,
    extractors::ToolArguments,
    metrics::observe_tool_invocation,
    state::{HealthCheck, ServerState, UpstreamHealth},
};

/// Health check endpoint handler
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    summary = "Health check endpoint",
    description = "Returns the service version, environment, active network, upstream explorer URL and response cache statistics. Does not contact the upstream explorer.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthCheck)
    )
)]
pub async fn health_handler(State(state): State<ServerState>) -> Json<HealthCheck> {
    Json(state.health_check())
}

/// Upstream probe handler
#[utoipa::path(
    get,
    path = "/health/upstream",
    tag = "health",
    summary = "Upstream explorer health",
    description = "Runs a cheap search against the upstream explorer through the request pipeline. Answers 503 when the upstream is down; throttling is reported as degraded with status 200.",
    responses(
        (status = 200, description = "Upstream is up or degraded", body = UpstreamHealth),
        (status = 503, description = "Upstream is down", body = UpstreamHealth)
    )
)]
pub async fn upstream_health_handler(
    State(state): State<ServerState>,
) -> (StatusCode, Json<UpstreamHealth>) {
    let health = state.upstream_health().await;
    let status = if health.probe.status.is_available() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(health))
}

/// Tool listing
#[derive(Debug, Serialize, ToSchema)]
pub struct ToolListing {
    /// Usage notes for choosing and chaining tools
    pub instructions: &'static str,
    /// Network the tools read from
    pub network: Network,
    /// Every tool with its description
    pub tools: Vec<ToolDescriptor>,
}

/// List the available tools
#[utoipa::path(
    get,
    path = "/v1/tools",
    tag = "tools",
    summary = "List tools",
    description = "Returns every tool name with a one-line description, plus usage instructions.",
    responses(
        (status = 200, description = "Tool listing", body = ToolListing)
    )
)]
pub async fn list_tools_handler(State(state): State<ServerState>) -> Json<ToolListing> {
    Json(ToolListing {
        instructions: INSTRUCTIONS,
        network: state.config().network,
        tools: state.registry().descriptors(),
    })
}

/// Invoke a tool
///
/// Tool failures (invalid arguments, upstream errors) are answered with status 200 and an
/// outcome whose `isError` is set. Only an unknown tool name or an unreadable body is an
/// HTTP error.
#[utoipa::path(
    post,
    path = "/v1/tools/{name}",
    tag = "tools",
    summary = "Invoke a tool",
    description = "Runs the named tool with the JSON object in the request body as its arguments. An empty body means no arguments.",
    params(
        ("name" = String, Path, description = "Tool name, e.g. getAccountSummary", example = "getAccountSummary")
    ),
    request_body(content = Object, description = "Tool arguments", content_type = "application/json"),
    responses(
        (status = 200, description = "Tool ran; check isError", body = ToolOutcome),
        (status = 400, description = "Malformed JSON body", body = String),
        (status = 404, description = "Unknown tool", body = String)
    )
)]
pub async fn invoke_tool_handler(
    Path(name): Path<String>,
    State(state): State<ServerState>,
    ToolArguments(arguments): ToolArguments,
) -> Result<Json<ToolOutcome>, ServerError> {
    let tool: ToolName = name.parse()?;
    debug!(tool = %tool, "tool requested");

    let invocation = state.registry().run(tool, arguments).await;
    observe_tool_invocation(
        tool.as_str(),
        invocation.result_label(),
        invocation.elapsed.as_secs_f64(),
    );

    Ok(Json(invocation.outcome))
}

/// Router directory
#[derive(Debug, Serialize, ToSchema)]
pub struct RouterListing {
    /// Network the addresses belong to
    pub network: Network,
    /// Router name to address; the zero address marks a router not deployed on the network
    pub routers: BTreeMap<String, String>,
}

/// List known DEX routers
#[utoipa::path(
    get,
    path = "/v1/routers",
    tag = "tools",
    summary = "List known DEX routers",
    description = "Returns the router names accepted by getDexRouterActivity with their addresses on the active network, after configured overrides are applied.",
    responses(
        (status = 200, description = "Router directory", body = RouterListing)
    )
)]
pub async fn routers_handler(State(state): State<ServerState>) -> Json<RouterListing> {
    Json(RouterListing {
        network: state.config().network,
        routers: state.registry().routers(),
    })
}
