// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `getTransactionByHash`: one transaction with decoded call data and logs

use external_apis::{
    DecodedCall, ResourceId,
    normalize::{
        FieldPath, array, non_empty_object, resolve, string, text, timestamp_seconds, unsigned,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::ToolResult,
    registry::ToolContext,
    tools::common::{BLOCK_NUMBER, FROM, LOG_ADDRESS, TO, TxStatus, strings},
};

const HASH: &[FieldPath] = &[FieldPath::Key("hash")];
const TIMESTAMP: &[FieldPath] = &[
    FieldPath::Key("timestamp"),
    FieldPath::Key("block_timestamp"),
];
const STATUS: &[FieldPath] = &[
    FieldPath::Key("status"),
    FieldPath::Key("tx_status"),
    FieldPath::Key("result"),
];
const VALUE: &[FieldPath] = &[FieldPath::Key("value")];
const FEE: &[FieldPath] = &[
    FieldPath::Key("fee"),
    FieldPath::Nested("fee", "value"),
    FieldPath::Key("tx_fee"),
];
const METHOD: &[FieldPath] = &[FieldPath::Key("method"), FieldPath::Key("input_method")];
const DECODED: &[FieldPath] = &[FieldPath::Key("decoded_input"), FieldPath::Key("decoded")];
const LOGS: &[FieldPath] = &[FieldPath::Key("logs"), FieldPath::Key("log_events")];
const LOG_INDEX: &[FieldPath] = &[FieldPath::Key("index"), FieldPath::Key("log_index")];
const LOG_DATA: &[FieldPath] = &[FieldPath::Key("data")];
const LOG_TOPICS: &[FieldPath] = &[FieldPath::Key("topics")];

/// Arguments of `getTransactionByHash`
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionInput {
    /// Transaction hash
    pub hash: ResourceId,
}

/// Log emitted by the transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionLog {
    /// Position within the block
    pub index: Option<u64>,
    /// Emitting contract
    pub address: Option<String>,
    /// Unindexed event data
    pub data: Option<String>,
    /// Indexed topics
    pub topics: Vec<String>,
}

impl TransactionLog {
    fn from_raw(raw: &Value) -> Self {
        Self {
            index: resolve(raw, LOG_INDEX, unsigned),
            address: resolve(raw, LOG_ADDRESS, string),
            data: resolve(raw, LOG_DATA, string),
            topics: resolve(raw, LOG_TOPICS, strings).unwrap_or_default(),
        }
    }
}

/// Output of `getTransactionByHash`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetails {
    /// Transaction hash
    pub hash: String,
    /// Including block
    pub block_number: Option<u64>,
    /// Block time in epoch seconds
    pub timestamp: Option<i64>,
    /// Execution status
    pub status: Option<TxStatus>,
    /// Sender
    pub from: Option<String>,
    /// Recipient or created contract
    pub to: Option<String>,
    /// Native value in wei
    pub value: Option<String>,
    /// Fee paid in wei
    pub fee: Option<String>,
    /// Method label reported upstream
    pub method: Option<String>,
    /// Decoded call data; `null` when nothing could be decoded
    pub decoded_method: Option<DecodedCall>,
    /// Emitted logs in upstream order
    pub logs: Vec<TransactionLog>,
}

impl TransactionDetails {
    /// Normalize a transaction payload, falling back to `requested` for the hash
    pub fn from_raw(raw: &Value, requested: &ResourceId) -> Self {
        let decoded_method = resolve(raw, DECODED, |source| {
            non_empty_object(source).map(|_| source)
        })
        .map(DecodedCall::from_source)
        .filter(|call| !call.is_empty());

        Self {
            hash: resolve(raw, HASH, string).unwrap_or_else(|| requested.to_string()),
            block_number: resolve(raw, BLOCK_NUMBER, unsigned),
            timestamp: resolve(raw, TIMESTAMP, timestamp_seconds),
            status: TxStatus::resolve(raw, STATUS),
            from: resolve(raw, FROM, string),
            to: resolve(raw, TO, string),
            value: resolve(raw, VALUE, text),
            fee: resolve(raw, FEE, text),
            method: resolve(raw, METHOD, string),
            decoded_method,
            logs: resolve(raw, LOGS, array)
                .map(|logs| logs.iter().map(TransactionLog::from_raw).collect())
                .unwrap_or_default(),
        }
    }
}

/// Fetch and normalize a transaction
pub async fn run(ctx: &ToolContext, input: TransactionInput) -> ToolResult<TransactionDetails> {
    let payload = ctx.client.transaction(&input.hash).await?;
    Ok(TransactionDetails::from_raw(payload.as_value(), &input.hash))
}
