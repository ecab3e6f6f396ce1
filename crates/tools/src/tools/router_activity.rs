// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `getDexRouterActivity`: recent transactions sent to a DEX router
//!
//! The router is given either as an address or as the name of a known router, in which
//! case the address for the active network is used.

use external_apis::{
    ActivityPage, ActivityQuery, ActivityScanner, ResourceId,
    activity::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{ToolError, ToolResult},
    registry::ToolContext,
};

const UNDEPLOYED: &str = "0x0000000000000000000000000000000000000000";

/// Arguments of `getDexRouterActivity`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterActivityInput {
    /// Router address or known router name
    pub router: String,
    /// Only keep transactions from the last N minutes
    #[serde(default)]
    pub since_minutes: Option<u32>,
    /// One-based page number
    #[serde(default)]
    pub page: Option<u32>,
    /// Items per page
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl RouterActivityInput {
    fn validate(&self) -> ToolResult<()> {
        if self.since_minutes == Some(0) {
            return Err(ToolError::invalid("sinceMinutes must be positive"));
        }
        if self.page == Some(0) {
            return Err(ToolError::invalid("page must be positive"));
        }
        if let Some(size) = self.page_size
            && !(1..=MAX_PAGE_SIZE).contains(&size)
        {
            return Err(ToolError::invalid(format!(
                "pageSize must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }
}

/// Output of `getDexRouterActivity`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterActivity {
    /// Known router name, when the router was given by name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub router_name: Option<String>,
    /// Requested page of activity
    #[serde(flatten)]
    pub page: ActivityPage,
}

/// Resolve a router name or address to the address to scan
fn resolve_router(ctx: &ToolContext, router: &str) -> ToolResult<(ResourceId, Option<String>)> {
    let Some(address) = ctx.router_address(router.trim()) else {
        return Ok((ResourceId::new(router)?, None));
    };

    if address.eq_ignore_ascii_case(UNDEPLOYED) {
        return Err(ToolError::invalid(format!(
            "router '{router}' is not deployed on {}",
            ctx.network()
        )));
    }

    Ok((ResourceId::new(address)?, Some(router.trim().to_string())))
}

/// Scan the router's inbound transactions
pub async fn run(ctx: &ToolContext, input: RouterActivityInput) -> ToolResult<RouterActivity> {
    input.validate()?;
    let (router, router_name) = resolve_router(ctx, &input.router)?;

    let mut query = ActivityQuery::new(router)
        .page(input.page.unwrap_or(1))
        .page_size(input.page_size.unwrap_or(DEFAULT_PAGE_SIZE));
    if let Some(minutes) = input.since_minutes {
        query = query.since_minutes(minutes);
    }

    debug!(router = %query.router, name = ?router_name, "scanning router activity");
    let page = ActivityScanner::new(ctx.client.clone()).scan(&query).await?;

    Ok(RouterActivity { router_name, page })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use api_client::{PipelineConfig, RateLimitConfig, RateLimiter, RequestPipeline, ResponseCache};
    use external_apis::{BlockscoutClient, default_routers};
    use serde_json::json;
    use shared_types::Network;

    use super::*;

    fn context(network: Network) -> ToolContext {
        let pipeline = RequestPipeline::new(
            PipelineConfig::new("http://127.0.0.1:9/api").unwrap(),
            Arc::new(ResponseCache::new(std::time::Duration::from_secs(1), 10)),
            Arc::new(RateLimiter::new(RateLimitConfig::default())),
        )
        .unwrap();
        ToolContext {
            client: BlockscoutClient::new(pipeline, network),
            routers: default_routers(),
        }
    }

    #[test]
    fn names_resolve_per_network() {
        let ctx = context(Network::BaseMainnet);
        let (address, name) = resolve_router(&ctx, "Uniswap_V3").unwrap();
        assert_eq!(address.as_str(), "0xe592427a0aece92de3edee1f18e0157c05861564");
        assert_eq!(name.as_deref(), Some("Uniswap_V3"));

        let (address, name) = resolve_router(&ctx, "0xABC").unwrap();
        assert_eq!(address.as_str(), "0xabc");
        assert_eq!(name, None);

        let ctx = context(Network::BaseSepolia);
        assert!(matches!(
            resolve_router(&ctx, "uniswap_v3"),
            Err(ToolError::InvalidInput { .. })
        ));
    }

    #[test]
    fn bounds_are_checked() {
        let parse = |value| serde_json::from_value::<RouterActivityInput>(value).unwrap();

        assert!(parse(json!({"router": "x", "sinceMinutes": 0})).validate().is_err());
        assert!(parse(json!({"router": "x", "page": 0})).validate().is_err());
        assert!(parse(json!({"router": "x", "pageSize": 101})).validate().is_err());
        assert!(parse(json!({"router": "x", "pageSize": 100, "sinceMinutes": 5})).validate().is_ok());
    }
}
