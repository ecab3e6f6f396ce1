// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `OpenAPI` documentation module
//!
//! This module provides `OpenAPI` specification and `Swagger UI` endpoints for API documentation.

use axum::{Json, http::StatusCode, response::Html};
use explorer_tools::{ToolContent, ToolDescriptor, ToolName, ToolOutcome};
use utoipa::OpenApi;

use crate::{
    routes::handlers::{self, RouterListing, ToolListing},
    state::{HealthCheck, UpstreamHealth},
};

/// `OpenAPI` document of the HTTP surface
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Base Explorer Tools",
        description = "Read-only Base blockchain explorer tools backed by the Blockscout API"
    ),
    paths(
        handlers::health_handler,
        handlers::upstream_health_handler,
        handlers::list_tools_handler,
        handlers::invoke_tool_handler,
        handlers::routers_handler,
    ),
    components(schemas(
        HealthCheck,
        UpstreamHealth,
        ToolListing,
        ToolDescriptor,
        ToolName,
        ToolOutcome,
        ToolContent,
        RouterListing,
    )),
    tags(
        (name = "health", description = "Service and upstream health"),
        (name = "tools", description = "Explorer tools")
    )
)]
pub struct ApiDoc;

/// `OpenAPI` specification endpoint
pub async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Swagger UI endpoint
pub async fn swagger_ui() -> Result<Html<&'static str>, StatusCode> {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Base Explorer Tools API</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css" />
    <style>
        html { box-sizing: border-box; overflow: -moz-scrollbars-vertical; overflow-y: scroll; }
        *, *:before, *:after { box-sizing: inherit; }
        body { margin:0; background: #fafafa; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {
            SwaggerUIBundle({
                url: '/api-doc/openapi.json',
                dom_id: '#swagger-ui',
                deepLinking: true,
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                plugins: [
                    SwaggerUIBundle.plugins.DownloadUrl
                ],
                layout: "StandaloneLayout"
            });
        }
    </script>
</body>
</html>
"#;
    Ok(Html(html))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/health",
            "/health/upstream",
            "/v1/tools",
            "/v1/tools/{name}",
            "/v1/routers",
        ] {
            assert!(
                paths.iter().any(|path| path.as_str() == expected),
                "missing {expected} in {paths:?}"
            );
        }
    }
}
