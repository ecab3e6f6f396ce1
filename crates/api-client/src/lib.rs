// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Request pipeline for upstream JSON APIs
//!
//! This crate mediates every outbound call to an upstream explorer API. Each call runs
//! through the same sequence of stages:
//!
//! 1. Cache lookup, keyed by the canonical URL and the sorted query parameters
//! 2. Rate limit acquisition on a process-wide fixed window
//! 3. HTTP request with JSON headers
//! 4. Shape validation of the JSON payload against the expected type
//! 5. Retry with bounded exponential backoff for transport and HTTP status failures
//! 6. Cache store of the validated payload
//!
//! # Core Abstractions
//!
//! - **[`RequestPipeline`]**: Orchestrates the stages above for a single base URL
//! - **[`ResponseCache`]**: TTL and LRU bounded store with hit/miss statistics
//! - **[`RateLimiter`]**: Non-blocking fixed window limiter keyed by caller identifier
//! - **[`RetryPolicy`]**: Attempt ceiling and backoff bounds, executed by [`retry::attempt`]
//! - **[`ApiError`]**: Failure taxonomy shared by every stage
//! - **[`HealthStatus`]**: Classification of upstream probes

pub mod cache;
pub mod error;
pub mod health;
pub mod pipeline;
pub mod query;
pub mod rate_limit;
pub mod retry;

pub use cache::{CacheStats, ResponseCache, cache_key};
pub use error::{ApiError, ApiResult};
pub use health::{HealthCheckResult, HealthStatus};
pub use pipeline::{Method, PipelineConfig, RequestOptions, RequestPipeline};
pub use query::QueryParams;
pub use rate_limit::{GLOBAL_RATE_LIMIT_KEY, RateLimitConfig, RateLimiter};
pub use retry::RetryPolicy;
