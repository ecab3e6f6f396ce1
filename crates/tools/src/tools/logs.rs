// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `getLogs`: event logs filtered by address, topics and block range
//!
//! When `transactionHash` is given the logs of that transaction are returned and the
//! other filters are not sent upstream.

use api_client::QueryParams;
use external_apis::{
    ResourceId,
    cursor::next_page_number,
    normalize::{FieldPath, resolve, string, timestamp_raw, unsigned},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{ToolError, ToolResult},
    registry::ToolContext,
    tools::common::{BLOCK_NUMBER, LOG_ADDRESS, strings},
};

/// Most topics accepted in a filter
pub const MAX_TOPICS: usize = 4;
/// Page size used when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// Largest accepted page size
pub const MAX_PAGE_SIZE: u32 = 100;

const DATA: &[FieldPath] = &[FieldPath::Key("data")];
const TOPICS: &[FieldPath] = &[FieldPath::Key("topics")];
const SINGLE_TOPIC: &[FieldPath] = &[FieldPath::Key("topic")];
const TRANSACTION_HASH: &[FieldPath] = &[
    FieldPath::Key("transaction_hash"),
    FieldPath::Key("tx_hash"),
];
const LOG_INDEX: &[FieldPath] = &[FieldPath::Key("log_index"), FieldPath::Key("index")];
const TIMESTAMP: &[FieldPath] = &[
    FieldPath::Key("timestamp"),
    FieldPath::Key("block_timestamp"),
];

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Arguments of `getLogs`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsInput {
    /// Emitting contract
    #[serde(default)]
    pub address: Option<ResourceId>,
    /// Topic filters, at most [`MAX_TOPICS`]
    #[serde(default)]
    pub topics: Vec<String>,
    /// First block, inclusive
    #[serde(default)]
    pub from_block: Option<u64>,
    /// Last block, inclusive
    #[serde(default)]
    pub to_block: Option<u64>,
    /// One-based page number
    #[serde(default = "default_page")]
    pub page: u32,
    /// Logs per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Read the logs of this transaction instead
    #[serde(default)]
    pub transaction_hash: Option<ResourceId>,
}

impl LogsInput {
    fn validate(&self) -> ToolResult<()> {
        if self.topics.len() > MAX_TOPICS {
            return Err(ToolError::invalid(format!(
                "at most {MAX_TOPICS} topics are allowed, got {}",
                self.topics.len()
            )));
        }
        if self.page == 0 {
            return Err(ToolError::invalid("page must be positive"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(ToolError::invalid(format!(
                "pageSize must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if let (Some(from), Some(to)) = (self.from_block, self.to_block)
            && from > to
        {
            return Err(ToolError::invalid(format!(
                "fromBlock {from} is after toBlock {to}"
            )));
        }
        Ok(())
    }

    fn to_query(&self) -> QueryParams {
        let topics = (!self.topics.is_empty()).then(|| self.topics.join(","));
        QueryParams::new()
            .with_opt("address", self.address.as_ref().map(ToString::to_string))
            .with_opt("topics", topics)
            .with_opt("from_block", self.from_block)
            .with_opt("to_block", self.to_block)
            .with("page", self.page)
            .with("page_size", self.page_size)
    }
}

/// One event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Emitting contract
    pub address: Option<String>,
    /// Unindexed event data
    pub data: Option<String>,
    /// Indexed topics
    pub topics: Vec<String>,
    /// Including block
    pub block_number: Option<u64>,
    /// Emitting transaction
    pub transaction_hash: Option<String>,
    /// Position within the block
    pub log_index: Option<u64>,
    /// Upstream epoch value, when numeric
    pub timestamp: Option<i64>,
}

impl LogRecord {
    /// Normalize a raw log; a lone `topic` string counts as a one-topic list
    pub fn from_raw(raw: &Value) -> Self {
        let topics = resolve(raw, TOPICS, strings)
            .or_else(|| resolve(raw, SINGLE_TOPIC, string).map(|topic| vec![topic]))
            .unwrap_or_default();

        Self {
            address: resolve(raw, LOG_ADDRESS, string),
            data: resolve(raw, DATA, string),
            topics,
            block_number: resolve(raw, BLOCK_NUMBER, unsigned),
            transaction_hash: resolve(raw, TRANSACTION_HASH, string),
            log_index: resolve(raw, LOG_INDEX, unsigned),
            timestamp: resolve(raw, TIMESTAMP, timestamp_raw),
        }
    }
}

/// Output of `getLogs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogPage {
    /// Requested page
    pub page: u32,
    /// Requested page size
    pub page_size: u32,
    /// Following page, when upstream reports one
    pub next_page: Option<u64>,
    /// Logs in upstream order
    pub items: Vec<LogRecord>,
}

/// Fetch one page of logs
pub async fn run(ctx: &ToolContext, input: LogsInput) -> ToolResult<LogPage> {
    input.validate()?;

    let payload = match &input.transaction_hash {
        Some(hash) => ctx.client.transaction_logs(hash).await?,
        None => ctx.client.logs(input.to_query()).await?,
    };

    Ok(LogPage {
        page: input.page,
        page_size: input.page_size,
        next_page: next_page_number(payload.as_value()),
        items: payload.items().iter().map(LogRecord::from_raw).collect(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn input(arguments: Value) -> LogsInput {
        serde_json::from_value(arguments).unwrap()
    }

    #[test]
    fn defaults_and_query() {
        let logs = input(json!({"address": "0xABC", "topics": ["0x1", "0x2"], "fromBlock": 10}));
        assert_eq!(logs.page, 1);
        assert_eq!(logs.page_size, 100);
        logs.validate().unwrap();

        let query = logs.to_query();
        assert_eq!(query.get("address"), Some(&json!("0xabc")));
        assert_eq!(query.get("topics"), Some(&json!("0x1,0x2")));
        assert_eq!(query.get("from_block"), Some(&json!(10)));
        assert!(!query.contains_key("to_block"));
        assert_eq!(query.get("page_size"), Some(&json!(100)));
    }

    #[test]
    fn constraints_are_enforced() {
        let too_many = input(json!({"topics": ["a", "b", "c", "d", "e"]}));
        assert!(too_many.validate().is_err());

        assert!(input(json!({"pageSize": 101})).validate().is_err());
        assert!(input(json!({"pageSize": 0})).validate().is_err());
        assert!(input(json!({"page": 0})).validate().is_err());
        assert!(input(json!({"fromBlock": 5, "toBlock": 4})).validate().is_err());
        assert!(input(json!({})).validate().is_ok());
    }

    #[test]
    fn record_normalization() {
        let record = LogRecord::from_raw(&json!({
            "address": {"hash": "0xc0de"},
            "data": "0x",
            "topics": ["0xddf2", null],
            "block_number": 12,
            "transaction_hash": "0xfeed",
            "index": "3",
            "block_timestamp": "1700000000"
        }));
        assert_eq!(record.address.as_deref(), Some("0xc0de"));
        assert_eq!(record.topics, vec!["0xddf2".to_string()]);
        assert_eq!(record.log_index, Some(3));
        assert_eq!(record.timestamp, Some(1_700_000_000));

        let single = LogRecord::from_raw(&json!({"topic": "0xaa", "timestamp": "2024-01-01"}));
        assert_eq!(single.topics, vec!["0xaa".to_string()]);
        assert_eq!(single.timestamp, None);
    }
}
