// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Blockscout v2 REST client
//!
//! Every call goes through [`RequestPipeline`], so caching, rate limiting and retries apply
//! uniformly. Payloads are only checked to be JSON objects (or, for token balances, an
//! object or an array); field-level interpretation is left to the callers because
//! Blockscout field names vary between deployments.

use std::time::Instant;

use api_client::{
    ApiResult, HealthCheckResult, HealthStatus, QueryParams, RequestOptions, RequestPipeline,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::Network;
use tracing::{info, warn};

use crate::{
    cursor::NextPage,
    normalize::{FieldPath, array, resolve},
    resource_id::ResourceId,
};

/// Search term used to probe upstream health
pub const HEALTH_PROBE_QUERY: &str = "base";

const ITEM_FIELDS: &[FieldPath] = &[FieldPath::Key("items"), FieldPath::Key("result")];
const BALANCE_FIELDS: &[FieldPath] = &[
    FieldPath::Key("items"),
    FieldPath::Key("result"),
    FieldPath::Key("data"),
];

/// A JSON payload known to be an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct ObjectPayload(Value);

impl TryFrom<Value> for ObjectPayload {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        if value.is_object() {
            Ok(Self(value))
        } else {
            Err(format!("expected a JSON object, got {}", json_kind(&value)))
        }
    }
}

impl From<ObjectPayload> for Value {
    fn from(payload: ObjectPayload) -> Self {
        payload.0
    }
}

impl ObjectPayload {
    /// Payload as a JSON value
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Value stored under `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Listing entries under `items` or `result`; empty when neither is an array
    pub fn items(&self) -> &[Value] {
        resolve(&self.0, ITEM_FIELDS, array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Continuation advertised by a listing
    pub fn next_page(&self) -> Option<NextPage> {
        NextPage::from_payload(&self.0)
    }
}

/// Token balances, returned either as a bare array or wrapped in an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenBalances {
    /// Bare array of balance entries
    List(Vec<Value>),
    /// Object holding the entries under `items`, `result` or `data`
    Wrapped(ObjectPayload),
}

impl TokenBalances {
    /// Balance entries in upstream order
    pub fn entries(&self) -> &[Value] {
        match self {
            Self::List(entries) => entries,
            Self::Wrapped(payload) => resolve(payload.as_value(), BALANCE_FIELDS, array)
                .map(Vec::as_slice)
                .unwrap_or_default(),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Blockscout client for one network
#[derive(Debug, Clone)]
pub struct BlockscoutClient {
    pipeline: RequestPipeline,
    network: Network,
}

impl BlockscoutClient {
    /// Create a client over an existing pipeline
    pub fn new(pipeline: RequestPipeline, network: Network) -> Self {
        Self { pipeline, network }
    }

    /// Network this client reads from
    pub fn network(&self) -> Network {
        self.network
    }

    /// Underlying request pipeline
    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    /// Address overview (balance, nonce, counters on some deployments)
    pub async fn address(&self, address: &ResourceId) -> ApiResult<ObjectPayload> {
        self.pipeline
            .request(&format!("/v2/addresses/{address}"), RequestOptions::new())
            .await
    }

    /// Token balances held by an address
    pub async fn address_token_balances(
        &self,
        address: &ResourceId,
        query: Option<QueryParams>,
    ) -> ApiResult<TokenBalances> {
        self.pipeline
            .request(
                &format!("/v2/addresses/{address}/token-balances"),
                RequestOptions::new().query_opt(query),
            )
            .await
    }

    /// Transaction, transfer and gas counters for an address
    pub async fn address_counters(&self, address: &ResourceId) -> ApiResult<ObjectPayload> {
        self.pipeline
            .request(
                &format!("/v2/addresses/{address}/counters"),
                RequestOptions::new(),
            )
            .await
    }

    /// One page of transactions involving an address
    pub async fn address_transactions(
        &self,
        address: &ResourceId,
        query: Option<QueryParams>,
    ) -> ApiResult<ObjectPayload> {
        self.pipeline
            .request(
                &format!("/v2/addresses/{address}/transactions"),
                RequestOptions::new().query_opt(query).no_cache(),
            )
            .await
    }

    /// One page of token transfers involving an address
    pub async fn address_token_transfers(
        &self,
        address: &ResourceId,
        query: Option<QueryParams>,
    ) -> ApiResult<ObjectPayload> {
        self.pipeline
            .request(
                &format!("/v2/addresses/{address}/token-transfers"),
                RequestOptions::new().query_opt(query).no_cache(),
            )
            .await
    }

    /// One page of transfers of a token contract
    pub async fn token_transfers(
        &self,
        token: &ResourceId,
        query: Option<QueryParams>,
    ) -> ApiResult<ObjectPayload> {
        self.pipeline
            .request(
                &format!("/v2/tokens/{token}/transfers"),
                RequestOptions::new().query_opt(query).no_cache(),
            )
            .await
    }

    /// Transaction details
    pub async fn transaction(&self, hash: &ResourceId) -> ApiResult<ObjectPayload> {
        self.pipeline
            .request(
                &format!("/v2/transactions/{hash}"),
                RequestOptions::new().no_cache(),
            )
            .await
    }

    /// Verified source metadata and ABI of a contract
    pub async fn smart_contract(&self, address: &ResourceId) -> ApiResult<ObjectPayload> {
        self.pipeline
            .request(
                &format!("/v2/smart-contracts/{address}"),
                RequestOptions::new(),
            )
            .await
    }

    /// Logs emitted by a transaction
    pub async fn transaction_logs(&self, hash: &ResourceId) -> ApiResult<ObjectPayload> {
        self.pipeline
            .request(
                &format!("/v2/transactions/{hash}/logs"),
                RequestOptions::new().no_cache(),
            )
            .await
    }

    /// Filtered event logs
    pub async fn logs(&self, query: QueryParams) -> ApiResult<ObjectPayload> {
        self.pipeline
            .request("/v2/logs", RequestOptions::new().query(query).no_cache())
            .await
    }

    /// Free text search over addresses, tokens, blocks and transactions
    pub async fn search(&self, term: &str) -> ApiResult<ObjectPayload> {
        self.pipeline
            .request(
                "/v2/search",
                RequestOptions::new().query(QueryParams::new().with("q", term)),
            )
            .await
    }

    /// Token metadata
    pub async fn token(&self, address: &ResourceId) -> ApiResult<ObjectPayload> {
        self.pipeline
            .request(&format!("/v2/tokens/{address}"), RequestOptions::new())
            .await
    }

    /// Probe upstream with a cheap search
    pub async fn health_check(&self) -> HealthCheckResult {
        let started = Instant::now();
        let status = match self.search(HEALTH_PROBE_QUERY).await {
            Ok(_) => {
                info!(network = %self.network, "blockscout health check passed");
                HealthStatus::Up
            }
            Err(error) => {
                warn!(network = %self.network, error = %error, "blockscout health check failed");
                HealthStatus::from_error(&error)
            }
        };

        HealthCheckResult::new(status, started.elapsed())
    }
}
