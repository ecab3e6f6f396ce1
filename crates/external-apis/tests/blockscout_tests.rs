// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the Blockscout client
//!
//! These tests use wiremock to simulate the Blockscout v2 API.

use std::{sync::Arc, time::Duration};

use api_client::{
    ApiError, HealthStatus, PipelineConfig, QueryParams, RateLimitConfig, RateLimiter,
    RequestPipeline, ResponseCache, RetryPolicy,
};
use external_apis::{BlockscoutClient, ResourceId};
use serde_json::json;
use shared_types::Network;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn create_test_client(base_url: &str) -> BlockscoutClient {
    let config = PipelineConfig::new(base_url)
        .unwrap()
        .with_retry(RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(2)));
    let pipeline = RequestPipeline::new(
        config,
        Arc::new(ResponseCache::new(Duration::from_secs(15), 100)),
        Arc::new(RateLimiter::new(RateLimitConfig {
            points: 100,
            duration: Duration::from_secs(1),
        })),
    )
    .unwrap();

    BlockscoutClient::new(pipeline, Network::BaseMainnet)
}

fn id(raw: &str) -> ResourceId {
    ResourceId::new(raw).unwrap()
}

#[tokio::test]
async fn address_path_is_lowercased_and_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/addresses/0xabcdef"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"hash": "0xabcdef", "coin_balance": "10"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&format!("{}/api", mock_server.uri()));

    let first = client.address(&id("0xABCDEF")).await.unwrap();
    let second = client.address(&id("0xabcdef")).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.get("coin_balance"), Some(&json!("10")));
}

#[tokio::test]
async fn transaction_lookups_are_never_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/transactions/0x01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hash": "0x01"})))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&format!("{}/api", mock_server.uri()));

    client.transaction(&id("0x01")).await.unwrap();
    client.transaction(&id("0x01")).await.unwrap();
}

#[tokio::test]
async fn token_balances_accept_arrays() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/addresses/0xabc/token-balances"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"token": {"symbol": "USDC"}, "value": "1"},
            {"token": {"symbol": "WETH"}, "value": "2"}
        ])))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&format!("{}/api", mock_server.uri()));
    let balances = client
        .address_token_balances(&id("0xabc"), None)
        .await
        .unwrap();

    assert_eq!(balances.entries().len(), 2);
}

#[tokio::test]
async fn non_object_payload_is_a_shape_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/tokens/0xabc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["unexpected"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&format!("{}/api", mock_server.uri()));
    let error = client.token(&id("0xabc")).await.unwrap_err();

    assert!(matches!(error, ApiError::UpstreamShape { .. }));
}

#[tokio::test]
async fn logs_and_search_send_query_parameters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/logs"))
        .and(query_param("address", "0xabc"))
        .and(query_param("topics", "0x1,0x2"))
        .and(query_param("page_size", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [], "next_page": 2})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/search"))
        .and(query_param("q", "usdc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [{"type": "token"}]})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&format!("{}/api", mock_server.uri()));

    let logs = client
        .logs(
            QueryParams::new()
                .with("address", "0xabc")
                .with("topics", "0x1,0x2")
                .with("page_size", 100),
        )
        .await
        .unwrap();
    assert!(logs.items().is_empty());

    let results = client.search("usdc").await.unwrap();
    assert_eq!(results.items().len(), 1);
}

#[tokio::test]
async fn health_check_reports_up_and_down() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/search"))
        .and(query_param("q", "base"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&format!("{}/api", mock_server.uri()));
    assert_eq!(client.health_check().await.status, HealthStatus::Up);

    let down_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&down_server)
        .await;

    let client = create_test_client(&format!("{}/api", down_server.uri()));
    let result = client.health_check().await;
    assert!(matches!(result.status, HealthStatus::Down { .. }));
}
