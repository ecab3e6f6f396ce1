// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `getTransactions`: paginated transaction history of an address

use external_apis::{
    PageCursor, ResourceId,
    cursor::next_cursor,
    normalize::{FieldPath, resolve, string, timestamp_seconds},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::ToolResult,
    registry::ToolContext,
    tools::common::{FROM, TO, TxStatus},
};

const HASH: &[FieldPath] = &[FieldPath::Key("hash"), FieldPath::Key("tx_hash")];
const VALUE: &[FieldPath] = &[FieldPath::Key("value")];
const METHOD: &[FieldPath] = &[FieldPath::Key("method"), FieldPath::Key("call_type")];
const STATUS: &[FieldPath] = &[FieldPath::Key("status"), FieldPath::Key("result")];
const TIMESTAMP: &[FieldPath] = &[
    FieldPath::Key("timestamp"),
    FieldPath::Key("block_timestamp"),
    FieldPath::Key("time"),
];

/// Which side of a transaction the address is on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Address is the recipient
    In,
    /// Address is the sender
    Out,
    /// Either side
    #[default]
    All,
}

impl Direction {
    /// Upstream `filter` value, if the direction narrows the listing
    pub const fn filter(self) -> Option<&'static str> {
        match self {
            Self::In => Some("to"),
            Self::Out => Some("from"),
            Self::All => None,
        }
    }
}

/// Arguments of `getTransactions`
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionsInput {
    /// Account address
    pub address: ResourceId,
    /// Direction filter
    #[serde(default)]
    pub direction: Direction,
    /// Cursor returned as `nextCursor` by a previous call
    #[serde(default)]
    pub cursor: Option<PageCursor>,
}

/// Transaction entry of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionSummary {
    /// Transaction hash
    pub hash: String,
    /// Sender
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Recipient
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Native value in wei
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Called method or call type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Execution status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TxStatus>,
    /// Epoch seconds, or the upstream epoch value when numeric
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl TransactionSummary {
    /// Normalize a raw entry; entries without a hash are dropped
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let hash = resolve(raw, HASH, string).filter(|hash| !hash.is_empty())?;
        Some(Self {
            hash,
            from: resolve(raw, FROM, string),
            to: resolve(raw, TO, string),
            value: resolve(raw, VALUE, string),
            method: resolve(raw, METHOD, string),
            status: TxStatus::resolve(raw, STATUS),
            timestamp: resolve(raw, TIMESTAMP, timestamp_seconds),
        })
    }
}

/// Output of `getTransactions`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    /// Account address
    pub address: String,
    /// Cursor this page was requested with
    pub cursor: Option<PageCursor>,
    /// Cursor for the following page
    pub next_cursor: Option<PageCursor>,
    /// Transactions in upstream order
    pub items: Vec<TransactionSummary>,
}

/// Fetch one page of transactions
pub async fn run(ctx: &ToolContext, input: TransactionsInput) -> ToolResult<TransactionPage> {
    let mut query = input
        .cursor
        .as_ref()
        .map(PageCursor::to_query)
        .unwrap_or_default();
    if let Some(filter) = input.direction.filter() {
        query.insert_if_absent("filter", filter);
    }

    let payload = ctx
        .client
        .address_transactions(&input.address, Some(query))
        .await?;

    Ok(TransactionPage {
        address: input.address.to_string(),
        next_cursor: next_cursor(payload.as_value()),
        cursor: input.cursor,
        items: payload
            .items()
            .iter()
            .filter_map(TransactionSummary::from_raw)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn summary_normalizes_blockscout_entry() {
        let raw = json!({
            "hash": "0xfeed",
            "from": {"hash": "0xaaa"},
            "to": {"hash": "0xbbb"},
            "value": "1000",
            "method": "transfer",
            "status": "ok",
            "result": "success",
            "timestamp": "2024-01-01T00:00:10.000000Z"
        });

        let summary = TransactionSummary::from_raw(&raw).unwrap();
        assert_eq!(summary.from.as_deref(), Some("0xaaa"));
        assert_eq!(summary.to.as_deref(), Some("0xbbb"));
        assert_eq!(summary.status, Some(TxStatus::Success));
        assert_eq!(summary.timestamp, Some(1_704_067_210));
    }

    #[test]
    fn entries_without_hash_are_dropped() {
        assert!(TransactionSummary::from_raw(&json!({"hash": ""})).is_none());
        assert!(TransactionSummary::from_raw(&json!({"from": "0x1"})).is_none());
        assert!(TransactionSummary::from_raw(&json!({"tx_hash": "0x1"})).is_some());
    }

    #[test]
    fn optional_fields_are_omitted() {
        let summary = TransactionSummary::from_raw(&json!({"hash": "0x1", "time": 1700})).unwrap();
        assert_eq!(
            serde_json::to_value(summary).unwrap(),
            json!({"hash": "0x1", "timestamp": 1700})
        );
    }

    #[test]
    fn direction_maps_to_filter() {
        assert_eq!(Direction::In.filter(), Some("to"));
        assert_eq!(Direction::Out.filter(), Some("from"));
        assert_eq!(Direction::default().filter(), None);

        let input: TransactionsInput =
            serde_json::from_value(json!({"address": "0xABC", "direction": "out"})).unwrap();
        assert_eq!(input.direction, Direction::Out);
        assert_eq!(input.address.as_str(), "0xabc");
    }

    #[test]
    fn cursor_must_hold_scalars() {
        let result = serde_json::from_value::<TransactionsInput>(
            json!({"address": "0xabc", "cursor": {"block_number": {"nested": 1}}}),
        );
        assert!(result.is_err());
    }
}
