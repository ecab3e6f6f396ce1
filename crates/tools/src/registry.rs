// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Tool lookup and invocation
//!
//! Tools are addressed by [`ToolName`]. [`ToolRegistry::invoke`] never fails: argument
//! errors and upstream failures are reported inside the returned [`ToolOutcome`] with
//! `isError` set, the same way a successful result carries its record.

use std::{
    collections::BTreeMap,
    fmt,
    future::Future,
    str::FromStr,
    time::{Duration, Instant},
};

use external_apis::{BlockscoutClient, RouterMap, select_for_network};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use shared_types::Network;
use thiserror::Error;
use tracing::{debug, error, info};
use utoipa::ToSchema;

use crate::{
    error::{ToolError, ToolResult},
    tools::{
        account, contract, logs, router_activity, search, token, transaction, transactions,
        transfers,
    },
};

/// Name of a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ToolName {
    /// Balance, nonce, transaction count and token balances of an address
    #[serde(rename = "getAccountSummary")]
    AccountSummary,
    /// Paginated transactions of an address
    #[serde(rename = "getTransactions")]
    Transactions,
    /// One transaction with decoded call data
    #[serde(rename = "getTransactionByHash")]
    TransactionByHash,
    /// Verified ABI of a contract
    #[serde(rename = "getContractABI")]
    ContractAbi,
    /// Paginated transfers of a token
    #[serde(rename = "getTokenTransfers")]
    TokenTransfers,
    /// Free text search
    #[serde(rename = "search")]
    Search,
    /// Event logs
    #[serde(rename = "getLogs")]
    Logs,
    /// Recent calls into a DEX router
    #[serde(rename = "getDexRouterActivity")]
    DexRouterActivity,
    /// Token metadata
    #[serde(rename = "resolveToken")]
    ResolveToken,
}

impl ToolName {
    /// Every tool, in listing order
    pub const fn all() -> &'static [Self] {
        &[
            Self::AccountSummary,
            Self::Transactions,
            Self::TransactionByHash,
            Self::ContractAbi,
            Self::TokenTransfers,
            Self::Search,
            Self::Logs,
            Self::DexRouterActivity,
            Self::ResolveToken,
        ]
    }

    /// Wire name of the tool
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccountSummary => "getAccountSummary",
            Self::Transactions => "getTransactions",
            Self::TransactionByHash => "getTransactionByHash",
            Self::ContractAbi => "getContractABI",
            Self::TokenTransfers => "getTokenTransfers",
            Self::Search => "search",
            Self::Logs => "getLogs",
            Self::DexRouterActivity => "getDexRouterActivity",
            Self::ResolveToken => "resolveToken",
        }
    }

    /// One-line description shown in the tool listing
    pub const fn description(self) -> &'static str {
        match self {
            Self::AccountSummary => {
                "Fetch ETH balance, nonce, transaction count, and top token balances for an address."
            }
            Self::Transactions => "List recent transactions for an address with pagination.",
            Self::TransactionByHash => {
                "Fetch a transaction by hash with decoded method information when available."
            }
            Self::ContractAbi => "Fetch the verified ABI and metadata for a smart contract.",
            Self::TokenTransfers => "List token transfer events involving the given address.",
            Self::Search => "Search for addresses, tokens, or transactions on Blockscout.",
            Self::Logs => "Retrieve contract logs filtered by address and topics.",
            Self::DexRouterActivity => {
                "Inspect recent transactions sent to a known DEX router address."
            }
            Self::ResolveToken => "Look up metadata for a token contract.",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool name that matches no tool
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tool: {0}")]
pub struct UnknownToolName(pub String);

impl FromStr for ToolName {
    type Err = UnknownToolName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| UnknownToolName(s.to_string()))
    }
}

/// Listing entry for a tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ToolDescriptor {
    /// Tool name
    pub name: ToolName,
    /// What the tool does
    pub description: &'static str,
}

impl From<ToolName> for ToolDescriptor {
    fn from(name: ToolName) -> Self {
        Self {
            name,
            description: name.description(),
        }
    }
}

/// One content block of a tool result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Plain text: pretty printed JSON on success, the error message on failure
    Text {
        /// Text body
        text: String,
    },
}

/// Result of invoking a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutcome {
    /// Human readable rendering of the result
    pub content: Vec<ToolContent>,
    /// Output record of a successful run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub structured_content: Option<Value>,
    /// Set when the run failed
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolOutcome {
    /// Successful outcome carrying `record`
    pub fn success(record: Value) -> ToolResult<Self> {
        let text = serde_json::to_string_pretty(&record)?;
        Ok(Self {
            content: vec![ToolContent::Text { text }],
            structured_content: Some(record),
            is_error: false,
        })
    }

    /// Failed outcome carrying the error message
    pub fn failure(error: &ToolError) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: error.to_string(),
            }],
            structured_content: None,
            is_error: true,
        }
    }

    /// Text of the first content block
    pub fn text(&self) -> &str {
        self.content
            .first()
            .map_or("", |ToolContent::Text { text }| text.as_str())
    }
}

/// A finished tool run
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Wire result
    pub outcome: ToolOutcome,
    /// Kind of the error the run failed with
    pub error_kind: Option<&'static str>,
    /// Time spent in the tool
    pub elapsed: Duration,
}

impl Invocation {
    /// `ok`, or the error kind
    pub fn result_label(&self) -> &'static str {
        self.error_kind.unwrap_or("ok")
    }
}

/// Shared state handed to every tool
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Explorer client for the active network
    pub client: BlockscoutClient,
    /// Known DEX routers
    pub routers: RouterMap,
}

impl ToolContext {
    /// Network the client reads from
    pub fn network(&self) -> Network {
        self.client.network()
    }

    /// Address of the router called `name` on the active network
    pub fn router_address(&self, name: &str) -> Option<&str> {
        self.routers
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, addresses)| addresses.for_network(self.network()))
    }
}

/// Registry of the explorer tools
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    context: ToolContext,
}

impl ToolRegistry {
    /// Create a registry over `client` with the given router table
    pub fn new(client: BlockscoutClient, routers: RouterMap) -> Self {
        Self {
            context: ToolContext { client, routers },
        }
    }

    /// Shared tool state
    pub fn context(&self) -> &ToolContext {
        &self.context
    }

    /// Listing of every tool
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        ToolName::all().iter().copied().map(ToolDescriptor::from).collect()
    }

    /// Router name to address on the active network
    pub fn routers(&self) -> BTreeMap<String, String> {
        select_for_network(&self.context.routers, self.context.network())
    }

    /// Run `tool` with `arguments` and wrap the result
    pub async fn invoke(&self, tool: ToolName, arguments: Value) -> ToolOutcome {
        self.run(tool, arguments).await.outcome
    }

    /// Like [`Self::invoke`], also reporting how the run went
    pub async fn run(&self, tool: ToolName, arguments: Value) -> Invocation {
        let started = Instant::now();
        let result = match self.call(tool, arguments).await {
            Ok(record) => ToolOutcome::success(record),
            Err(error) => Err(error),
        };
        let elapsed = started.elapsed();

        match result {
            Ok(outcome) => {
                info!(tool = %tool, elapsed_ms = elapsed.as_millis(), "tool completed");
                Invocation {
                    outcome,
                    error_kind: None,
                    elapsed,
                }
            }
            Err(failure) => {
                error!(
                    tool = %tool,
                    kind = failure.kind(),
                    error = %failure,
                    elapsed_ms = elapsed.as_millis(),
                    "tool failed"
                );
                Invocation {
                    outcome: ToolOutcome::failure(&failure),
                    error_kind: Some(failure.kind()),
                    elapsed,
                }
            }
        }
    }

    /// Run `tool` and return its raw output record
    pub async fn call(&self, tool: ToolName, arguments: Value) -> ToolResult<Value> {
        debug!(tool = %tool, "invoking tool");
        let ctx = &self.context;

        match tool {
            ToolName::AccountSummary => dispatch(arguments, |input| account::run(ctx, input)).await,
            ToolName::Transactions => {
                dispatch(arguments, |input| transactions::run(ctx, input)).await
            }
            ToolName::TransactionByHash => {
                dispatch(arguments, |input| transaction::run(ctx, input)).await
            }
            ToolName::ContractAbi => dispatch(arguments, |input| contract::run(ctx, input)).await,
            ToolName::TokenTransfers => {
                dispatch(arguments, |input| transfers::run(ctx, input)).await
            }
            ToolName::Search => dispatch(arguments, |input| search::run(ctx, input)).await,
            ToolName::Logs => dispatch(arguments, |input| logs::run(ctx, input)).await,
            ToolName::DexRouterActivity => {
                dispatch(arguments, |input| router_activity::run(ctx, input)).await
            }
            ToolName::ResolveToken => dispatch(arguments, |input| token::run(ctx, input)).await,
        }
    }
}

/// Parse `arguments` into the tool input, run the tool and render its output
async fn dispatch<I, O, F, Fut>(arguments: Value, tool: F) -> ToolResult<Value>
where
    I: DeserializeOwned,
    O: Serialize,
    F: FnOnce(I) -> Fut,
    Fut: Future<Output = ToolResult<O>>,
{
    let arguments = match arguments {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    let input: I =
        serde_json::from_value(arguments).map_err(|e| ToolError::invalid(e.to_string()))?;
    let output = tool(input).await?;
    Ok(serde_json::to_value(output)?)
}
