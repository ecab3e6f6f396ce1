// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Base Explorer Tools Server
//!
//! HTTP server exposing the read-only Base explorer tools, built with Axum. Every tool call
//! goes through one shared request pipeline (cache, rate limiter, retries) towards the
//! Blockscout API of the configured network.
//!
//! # Module Structure
//!
//! - [`config`]: Server configuration and environment management with hierarchical loading
//! - [`error`]: Error types and HTTP response handling with proper status codes
//! - [`extractors`]: Tool argument extractor with detailed JSON error messages
//! - [`metrics`]: Prometheus collectors and the `/metrics` handler
//! - [`state`]: Shared application state with cancellation token support
//! - [`server`]: Server construction, lifecycle and coordinated shutdown
//! - [`routes`]: Route configuration and HTTP request handlers
//! - [`openapi`]: `OpenAPI` specification and Swagger UI endpoints for API documentation
//!
//! # Endpoints
//!
//! | method | path | purpose |
//! |---|---|---|
//! | GET | `/health` | version, environment, network, cache statistics |
//! | GET | `/health/upstream` | probe the upstream explorer |
//! | GET | `/v1/tools` | tool listing and usage instructions |
//! | POST | `/v1/tools/{name}` | invoke a tool |
//! | GET | `/v1/routers` | known DEX routers on the active network |
//! | GET | `/metrics` | Prometheus metrics |

pub mod config;
pub mod error;
pub mod extractors;
pub mod metrics;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{Environment, ServerConfig, UpstreamUrl};
pub use error::{ServerError, ServerResult};
pub use server::{Server, ShutdownConfig};
pub use shared_types::Network;
pub use state::{HealthCheck, ServerState, UpstreamHealth};
