// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for `RequestPipeline`
//!
//! These tests use wiremock as the upstream API and exercise caching, rate limiting,
//! retry and shape validation end to end.

use std::{sync::Arc, time::Duration};

use api_client::{
    ApiError, GLOBAL_RATE_LIMIT_KEY, PipelineConfig, QueryParams, RateLimitConfig, RateLimiter,
    RequestOptions, RequestPipeline, ResponseCache, RetryPolicy,
};
use serde::Deserialize;
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param, query_param_is_missing},
};

const TEST_RETRY_ATTEMPTS: u32 = 3;

#[derive(Debug, Deserialize, PartialEq)]
struct AddressInfo {
    hash: String,
    coin_balance: Option<String>,
}

struct Harness {
    pipeline: RequestPipeline,
    rate_limiter: Arc<RateLimiter>,
    cache: Arc<ResponseCache<Value>>,
}

fn harness(base_url: &str, points: u32, api_key: Option<&str>) -> Harness {
    let cache = Arc::new(ResponseCache::new(Duration::from_secs(15), 100));
    let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig {
        points,
        duration: Duration::from_secs(60),
    }));
    let config = PipelineConfig::new(base_url)
        .unwrap()
        .with_api_key(api_key.map(ToString::to_string))
        .with_retry(RetryPolicy::new(
            TEST_RETRY_ATTEMPTS,
            Duration::from_millis(1),
            Duration::from_millis(5),
        ));
    let pipeline =
        RequestPipeline::new(config, Arc::clone(&cache), Arc::clone(&rate_limiter)).unwrap();

    Harness {
        pipeline,
        rate_limiter,
        cache,
    }
}

fn api_base(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

/// A cached response is served without touching the network or the rate limiter
#[tokio::test]
async fn second_identical_request_is_served_from_cache() {
    let server = MockServer::start().await;
    let h = harness(&api_base(&server), 10, None);

    Mock::given(method("GET"))
        .and(path("/api/v2/addresses/0xabc"))
        .and(header("accept", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"hash": "0xabc", "coin_balance": "42"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let first: AddressInfo = h
        .pipeline
        .request("/v2/addresses/0xabc", RequestOptions::new())
        .await
        .unwrap();
    let second: AddressInfo = h
        .pipeline
        .request("v2/addresses/0xabc", RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first.coin_balance.as_deref(), Some("42"));
    assert_eq!(h.rate_limiter.remaining(GLOBAL_RATE_LIMIT_KEY), 9);
    assert_eq!(h.cache.stats().hits, 1);
}

/// Query parameter order does not change the cache key
#[tokio::test]
async fn reordered_query_hits_the_same_entry() {
    let server = MockServer::start().await;
    let h = harness(&api_base(&server), 10, None);

    Mock::given(method("GET"))
        .and(path("/api/v2/logs"))
        .and(query_param("address", "0xdef"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let first = QueryParams::new().with("address", "0xdef").with("page", 2);
    let second = QueryParams::new().with("page", 2).with("address", "0xdef");

    let _: Value = h
        .pipeline
        .request("/v2/logs", RequestOptions::new().query(first))
        .await
        .unwrap();
    let _: Value = h
        .pipeline
        .request("/v2/logs", RequestOptions::new().query(second))
        .await
        .unwrap();
}

/// Uncached requests always reach upstream
#[tokio::test]
async fn no_cache_option_bypasses_cache() {
    let server = MockServer::start().await;
    let h = harness(&api_base(&server), 10, None);

    Mock::given(method("GET"))
        .and(path("/api/v2/transactions/0x01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hash": "0x01"})))
        .expect(2)
        .mount(&server)
        .await;

    for _ in 0..2 {
        let _: Value = h
            .pipeline
            .request("/v2/transactions/0x01", RequestOptions::new().no_cache())
            .await
            .unwrap();
    }

    assert!(h.cache.is_empty());
    assert_eq!(h.rate_limiter.remaining(GLOBAL_RATE_LIMIT_KEY), 8);
}

/// Transient server errors are retried until success
#[tokio::test]
async fn retries_transient_failures() {
    let server = MockServer::start().await;
    let h = harness(&api_base(&server), 10, None);

    Mock::given(method("GET"))
        .and(path("/api/v2/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .up_to_n_times(2)
        .expect(2)
        .named("transient_failures")
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [1, 2]})))
        .expect(1)
        .named("successful_request")
        .mount(&server)
        .await;

    let result: Value = h
        .pipeline
        .request(
            "/v2/search",
            RequestOptions::new().query(QueryParams::new().with("q", "usdc")),
        )
        .await
        .unwrap();

    assert_eq!(result["items"], json!([1, 2]));
    // Every attempt consumes its own permit
    assert_eq!(h.rate_limiter.remaining(GLOBAL_RATE_LIMIT_KEY), 7);
}

/// Persistent failures surface the last HTTP error after exactly the attempt ceiling
#[tokio::test]
async fn gives_up_after_attempt_ceiling() {
    let server = MockServer::start().await;
    let h = harness(&api_base(&server), 10, None);

    Mock::given(method("GET"))
        .and(path("/api/v2/tokens/0xaaa"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(u64::from(TEST_RETRY_ATTEMPTS))
        .mount(&server)
        .await;

    let error = h
        .pipeline
        .request::<Value>("/v2/tokens/0xaaa", RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(
        error,
        ApiError::UpstreamHttp {
            status: 503,
            body: "unavailable".to_string()
        }
    );
    assert!(h.cache.is_empty());
}

/// Shape failures are not retried
#[tokio::test]
async fn shape_mismatch_is_not_retried() {
    let server = MockServer::start().await;
    let h = harness(&api_base(&server), 10, None);

    Mock::given(method("GET"))
        .and(path("/api/v2/addresses/0xabc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["not", "an", "object"])))
        .expect(1)
        .mount(&server)
        .await;

    let error = h
        .pipeline
        .request::<AddressInfo>("/v2/addresses/0xabc", RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::UpstreamShape { .. }));
    assert!(h.cache.is_empty());
}

/// Non-JSON bodies are shape failures
#[tokio::test]
async fn invalid_json_is_a_shape_failure() {
    let server = MockServer::start().await;
    let h = harness(&api_base(&server), 10, None);

    Mock::given(method("GET"))
        .and(path("/api/v2/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let error = h
        .pipeline
        .request::<Value>("/v2/logs", RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::UpstreamShape { .. }));
}

/// Rate limit denial aborts the call without a network request
#[tokio::test]
async fn rate_limit_denial_is_not_retried() {
    let server = MockServer::start().await;
    let h = harness(&api_base(&server), 1, None);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let _: Value = h
        .pipeline
        .request("/v2/addresses/0x1", RequestOptions::new())
        .await
        .unwrap();

    let error = h
        .pipeline
        .request::<Value>("/v2/addresses/0x2", RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::RateExceeded { ref key, .. } if key == "global"));
}

/// The API key travels upstream but never becomes part of the cache key
#[tokio::test]
async fn api_key_is_appended_after_cache_key() {
    let server = MockServer::start().await;
    let h = harness(&api_base(&server), 10, Some("secret"));

    Mock::given(method("GET"))
        .and(path("/api/v2/search"))
        .and(query_param("q", "weth"))
        .and(query_param("apikey", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let query = QueryParams::new().with("q", "weth");
    let _: Value = h
        .pipeline
        .request("/v2/search", RequestOptions::new().query(query.clone()))
        .await
        .unwrap();

    let key = h.pipeline.cache_key_for("/v2/search", Some(&query)).unwrap();
    assert!(!key.contains("apikey"));
    assert!(h.cache.get(&key).is_some());
}

/// Null query parameters are not sent
#[tokio::test]
async fn null_query_parameters_are_skipped() {
    let server = MockServer::start().await;
    let h = harness(&api_base(&server), 10, None);

    Mock::given(method("GET"))
        .and(path("/api/v2/logs"))
        .and(query_param("page", "1"))
        .and(query_param_is_missing("address"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let query = QueryParams::new().with("address", Value::Null).with("page", 1);
    let _: Value = h
        .pipeline
        .request("/v2/logs", RequestOptions::new().query(query).no_cache())
        .await
        .unwrap();
}

/// POST requests carry a JSON body
#[tokio::test]
async fn post_sends_json_body() {
    let server = MockServer::start().await;
    let h = harness(&api_base(&server), 10, None);

    Mock::given(method("POST"))
        .and(path("/api/v2/query"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"limit": 5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let result: Value = h
        .pipeline
        .request(
            "/v2/query",
            RequestOptions::new().post(json!({"limit": 5})).no_cache(),
        )
        .await
        .unwrap();

    assert_eq!(result, json!({"ok": true}));
}

/// Connection failures are transport errors
#[tokio::test]
async fn unreachable_upstream_is_a_transport_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let h = harness(&format!("http://127.0.0.1:{port}/api"), 10, None);

    let error = h
        .pipeline
        .request::<Value>("/v2/addresses/0xabc", RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::Transport { .. }));
    assert_eq!(
        h.rate_limiter.remaining(GLOBAL_RATE_LIMIT_KEY),
        10 - TEST_RETRY_ATTEMPTS
    );
}
