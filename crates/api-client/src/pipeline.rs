// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Request pipeline
//!
//! [`RequestPipeline`] is the single path for upstream traffic. A request is served from
//! the cache when a fresh entry exists; otherwise every attempt acquires a rate limit
//! permit, performs the HTTP call and validates the payload shape, and the whole attempt
//! is retried according to the configured [`RetryPolicy`]. Validated payloads are stored
//! back into the cache.

use std::{sync::Arc, time::Duration};

use reqwest::{
    Client, Url,
    header::{ACCEPT, CONTENT_TYPE},
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    cache::{ResponseCache, cache_key},
    error::{ApiError, ApiResult},
    query::QueryParams,
    rate_limit::{GLOBAL_RATE_LIMIT_KEY, RateLimiter},
    retry::{self, RetryPolicy},
};

const JSON_MEDIA_TYPE: &str = "application/json";
const DEFAULT_USER_AGENT: &str = concat!("base-explorer-tools/", env!("CARGO_PKG_VERSION"));

/// Settings for a [`RequestPipeline`]
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Upstream base URL, always ending with `/`
    base_url: Url,
    /// Optional API key appended as the `apikey` query parameter
    pub api_key: Option<String>,
    /// Retry policy applied to every network attempt
    pub retry: RetryPolicy,
    /// Per-attempt timeout; `None` keeps the transport default
    pub request_timeout: Option<Duration>,
    /// User agent sent upstream
    pub user_agent: String,
}

impl PipelineConfig {
    /// Create a configuration for the given base URL
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Configuration` if the URL cannot be parsed or cannot be a base.
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let trimmed = base_url.trim();
        let normalized = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{trimmed}/")
        };

        let base_url = Url::parse(&normalized).map_err(|e| ApiError::Configuration {
            message: format!("invalid base URL '{trimmed}': {e}"),
        })?;

        if base_url.cannot_be_a_base() {
            return Err(ApiError::Configuration {
                message: format!("base URL '{trimmed}' cannot be used as a base"),
            });
        }

        Ok(Self {
            base_url,
            api_key: None,
            retry: RetryPolicy::default(),
            request_timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    /// Set the API key, ignoring blank values
    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    /// Set the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set a per-attempt timeout
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Upstream base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

/// HTTP method and body of a request
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Method {
    /// Plain GET
    #[default]
    Get,
    /// POST with a JSON body
    Post(Value),
}

/// Per-request options
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    /// Query parameters; null values are skipped
    pub query: Option<QueryParams>,
    /// Method and body
    pub method: Method,
    /// Whether the response may be served from and stored into the cache
    pub cache: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            query: None,
            method: Method::Get,
            cache: true,
        }
    }
}

impl RequestOptions {
    /// Cached GET without query parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach query parameters
    #[must_use]
    pub fn query(mut self, query: QueryParams) -> Self {
        self.query = Some(query);
        self
    }

    /// Attach optional query parameters
    #[must_use]
    pub fn query_opt(mut self, query: Option<QueryParams>) -> Self {
        self.query = query;
        self
    }

    /// Send as POST with the given JSON body
    #[must_use]
    pub fn post(mut self, body: Value) -> Self {
        self.method = Method::Post(body);
        self
    }

    /// Bypass the cache for both lookup and store
    #[must_use]
    pub fn no_cache(mut self) -> Self {
        self.cache = false;
        self
    }
}

/// Cached, rate-limited, retrying JSON client for one upstream base URL
#[derive(Debug, Clone)]
pub struct RequestPipeline {
    client: Client,
    config: PipelineConfig,
    cache: Arc<ResponseCache<Value>>,
    rate_limiter: Arc<RateLimiter>,
}

impl RequestPipeline {
    /// Create a pipeline over shared cache and rate limiter instances
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Configuration` if the HTTP client cannot be built.
    pub fn new(
        config: PipelineConfig,
        cache: Arc<ResponseCache<Value>>,
        rate_limiter: Arc<RateLimiter>,
    ) -> ApiResult<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| ApiError::Configuration {
            message: format!("failed to build HTTP client: {e}"),
        })?;

        Ok(Self {
            client,
            config,
            cache,
            rate_limiter,
        })
    }

    /// Pipeline configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Shared response cache
    pub fn cache(&self) -> &Arc<ResponseCache<Value>> {
        &self.cache
    }

    /// Shared rate limiter
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// Cache key a request for `path` with `query` would use
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Configuration` if `path` cannot be joined onto the base URL.
    pub fn cache_key_for(&self, path: &str, query: Option<&QueryParams>) -> ApiResult<String> {
        let url = self.join(path)?;
        Ok(cache_key(&canonical_url(&url), query))
    }

    /// Perform a request and validate the JSON payload as `T`
    ///
    /// # Errors
    ///
    /// - `ApiError::RateExceeded` when no permit is available (never retried)
    /// - `ApiError::UpstreamShape` when the payload is not JSON or not a `T` (never retried)
    /// - `ApiError::UpstreamHttp` or `ApiError::Transport` once the retry ceiling is reached
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        let mut url = self.join(path)?;
        let key = cache_key(&canonical_url(&url), options.query.as_ref());

        if let Some(query) = &options.query {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query.rendered() {
                pairs.append_pair(name, &value);
            }
        }
        if let Some(api_key) = &self.config.api_key {
            url.query_pairs_mut().append_pair("apikey", api_key);
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        if options.cache
            && let Some(cached) = self.cache.get(&key)
        {
            debug!(key = %key, "serving upstream response from cache");
            return validate(&cached);
        }

        let target = &url;
        let method = &options.method;
        let (typed, payload) = retry::attempt(
            &self.config.retry,
            move || self.execute::<T>(target, method, path),
            ApiError::is_retryable,
        )
        .await?;

        if options.cache {
            self.cache.insert(key, payload);
        }

        Ok(typed)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        url: &Url,
        method: &Method,
        path: &str,
    ) -> ApiResult<(T, Value)> {
        self.rate_limiter.consume(GLOBAL_RATE_LIMIT_KEY)?;

        let builder = match method {
            Method::Get => self.client.get(url.clone()),
            Method::Post(_) => self.client.post(url.clone()),
        }
        .header(ACCEPT, JSON_MEDIA_TYPE)
        .header(CONTENT_TYPE, JSON_MEDIA_TYPE);

        let builder = match method {
            Method::Get => builder,
            Method::Post(body) => builder.json(body),
        };

        debug!(path, "sending upstream request");

        let response = builder.send().await.map_err(|e| ApiError::Transport {
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(path, status = status.as_u16(), "upstream returned an error status");
            return Err(ApiError::UpstreamHttp {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| ApiError::Transport {
            message: e.to_string(),
        })?;
        let payload: Value = serde_json::from_slice(&bytes)?;
        let typed = validate(&payload)?;

        debug!(path, status = status.as_u16(), "upstream request completed");
        Ok((typed, payload))
    }

    fn join(&self, path: &str) -> ApiResult<Url> {
        self.config
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Configuration {
                message: format!("invalid request path '{path}': {e}"),
            })
    }
}

/// Scheme, host, port and path of a URL
fn canonical_url(url: &Url) -> String {
    format!("{}{}", url.origin().ascii_serialization(), url.path())
}

fn validate<T: DeserializeOwned>(payload: &Value) -> ApiResult<T> {
    <T as Deserialize>::deserialize(payload).map_err(|e| ApiError::UpstreamShape {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::RateLimitConfig;

    fn pipeline(base_url: &str, api_key: Option<&str>) -> RequestPipeline {
        let config = PipelineConfig::new(base_url)
            .unwrap()
            .with_api_key(api_key.map(ToString::to_string));
        RequestPipeline::new(
            config,
            Arc::new(ResponseCache::new(Duration::from_secs(15), 10)),
            Arc::new(RateLimiter::new(RateLimitConfig::default())),
        )
        .unwrap()
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let config = PipelineConfig::new("https://base.blockscout.com/api").unwrap();
        assert_eq!(config.base_url().as_str(), "https://base.blockscout.com/api/");

        let config = PipelineConfig::new("https://base.blockscout.com/api/").unwrap();
        assert_eq!(config.base_url().as_str(), "https://base.blockscout.com/api/");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            PipelineConfig::new("not a url"),
            Err(ApiError::Configuration { .. })
        ));
        assert!(matches!(
            PipelineConfig::new("mailto:someone@example.com"),
            Err(ApiError::Configuration { .. })
        ));
    }

    #[test]
    fn blank_api_key_is_ignored() {
        let config = PipelineConfig::new("https://example.com/api")
            .unwrap()
            .with_api_key(Some("  ".to_string()));
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn cache_key_ignores_leading_slash_and_api_key() {
        let with_key = pipeline("https://base.blockscout.com/api", Some("secret"));
        let without_key = pipeline("https://base.blockscout.com/api/", None);
        let query = QueryParams::new().with("q", "usdc");

        let a = with_key.cache_key_for("/v2/search", Some(&query)).unwrap();
        let b = without_key.cache_key_for("v2/search", Some(&query)).unwrap();

        assert_eq!(a, b);
        assert_eq!(a, "https://base.blockscout.com/api/v2/search?q=usdc");
    }

    #[test]
    fn request_options_builders() {
        let options = RequestOptions::new()
            .query(QueryParams::new().with("filter", "to"))
            .post(serde_json::json!({"a": 1}))
            .no_cache();

        assert!(!options.cache);
        assert_eq!(options.method, Method::Post(serde_json::json!({"a": 1})));
        assert!(options.query.is_some());
        assert!(RequestOptions::default().cache);
    }
}
