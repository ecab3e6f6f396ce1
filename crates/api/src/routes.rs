// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Routes module
//!
//! Route table of the explorer tools server.

pub mod handlers;

use axum::{
    Router,
    routing::{get, post},
};
use handlers::{
    health_handler, invoke_tool_handler, list_tools_handler, routers_handler,
    upstream_health_handler,
};

use crate::{
    metrics::metrics_handler,
    openapi::{openapi_spec, swagger_ui},
    state::ServerState,
};

/// Create application routes
pub fn create_routes() -> Router<ServerState> {
    let health_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/health/upstream", get(upstream_health_handler))
        .route("/metrics", get(metrics_handler));

    let docs_routes = Router::new()
        .route("/api-doc/openapi.json", get(openapi_spec))
        .route("/swagger-ui", get(swagger_ui));

    let api_routes = Router::new()
        .route("/tools", get(list_tools_handler))
        .route("/tools/{name}", post(invoke_tool_handler))
        .route("/routers", get(routers_handler));

    Router::new()
        .merge(health_routes)
        .merge(docs_routes)
        .nest("/v1", api_routes)
}
