// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `getTokenTransfers`: paginated transfer events
//!
//! By default the address is treated as a token contract and its transfers are listed.
//! With `scope: "address"` the transfers sent or received by the address are listed
//! instead. Both listings use a `{blockNumber, index}` keyset cursor.

use api_client::QueryParams;
use external_apis::{
    ResourceId,
    cursor::next_cursor,
    normalize::{FieldPath, resolve, string, text, timestamp_seconds, unsigned},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::ToolResult,
    registry::ToolContext,
    tools::common::{BLOCK_NUMBER, FROM, TO, object_at},
};

const HASH: &[FieldPath] = &[
    FieldPath::Key("tx_hash"),
    FieldPath::Key("transaction_hash"),
];
const LOG_INDEX: &[FieldPath] = &[FieldPath::Key("log_index"), FieldPath::Key("index")];
const TIMESTAMP: &[FieldPath] = &[FieldPath::Key("timestamp")];
const TOKEN_SOURCE: &[FieldPath] = &[
    FieldPath::Key("token"),
    FieldPath::Key("contract"),
    FieldPath::Key("token_contract"),
];
const TOKEN_ADDRESS: &[FieldPath] = &[FieldPath::Key("address"), FieldPath::Key("address_hash")];
const TOKEN_SYMBOL: &[FieldPath] = &[FieldPath::Key("symbol")];
const TOKEN_NAME: &[FieldPath] = &[FieldPath::Key("name")];
const TOKEN_DECIMALS: &[FieldPath] = &[FieldPath::Key("decimals"), FieldPath::Key("decimal")];
const RECORD_DECIMALS: &[FieldPath] = &[FieldPath::Key("token_decimals")];
const AMOUNT: &[FieldPath] = &[
    FieldPath::Key("amount"),
    FieldPath::Key("value"),
    FieldPath::Nested("total", "value"),
];
const TRANSFER_TYPE: &[FieldPath] = &[FieldPath::Key("type"), FieldPath::Key("token_type")];

/// Listing a transfer query runs against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferScope {
    /// Transfers of the token contract at the address
    #[default]
    Token,
    /// Transfers sent or received by the address
    Address,
}

/// Keyset position in a transfer listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferCursor {
    /// Block of the last transfer seen
    pub block_number: u64,
    /// Log index of the last transfer seen
    pub index: u64,
}

impl TransferCursor {
    fn to_query(self) -> QueryParams {
        QueryParams::new()
            .with("block_number", self.block_number)
            .with("index", self.index)
    }

    /// Cursor advertised by a listing payload; both positions must be numeric
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let cursor = next_cursor(payload)?;
        Some(Self {
            block_number: cursor.get("block_number")?.as_u64()?,
            index: cursor.get("index")?.as_u64()?,
        })
    }
}

/// Arguments of `getTokenTransfers`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenTransfersInput {
    /// Token contract, or holder when `scope` is `address`
    pub address: ResourceId,
    /// Position returned as `nextCursor` by a previous call
    #[serde(default)]
    pub cursor: Option<TransferCursor>,
    /// Which listing to read
    #[serde(default)]
    pub scope: TransferScope,
}

/// Token moved by a transfer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferToken {
    /// Token contract
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Ticker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Decimal places of the smallest unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,
}

impl TransferToken {
    fn from_raw(record: &Value) -> Option<Self> {
        let source = object_at(record, TOKEN_SOURCE);
        let token = Self {
            address: resolve(source, TOKEN_ADDRESS, string),
            symbol: resolve(source, TOKEN_SYMBOL, string),
            name: resolve(source, TOKEN_NAME, string),
            decimals: resolve(source, TOKEN_DECIMALS, unsigned)
                .or_else(|| resolve(record, RECORD_DECIMALS, unsigned))
                .and_then(|d| u32::try_from(d).ok()),
        };
        (token != Self::default()).then_some(token)
    }
}

/// Transfer entry of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    /// Hash of the transaction that emitted the transfer
    pub hash: String,
    /// Position of the transfer log within the block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_index: Option<u64>,
    /// Including block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Epoch seconds; numeric upstream values are passed through
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Sender
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Recipient
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Token moved, when anything about it is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<TransferToken>,
    /// Raw amount in the token's smallest unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    /// Token standard, e.g. `ERC-20`
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub transfer_type: Option<String>,
}

impl TokenTransfer {
    /// Normalize a raw entry; entries without a transaction hash are dropped
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let hash = resolve(raw, HASH, string).filter(|hash| !hash.is_empty())?;
        Some(Self {
            hash,
            log_index: resolve(raw, LOG_INDEX, unsigned),
            block_number: resolve(raw, BLOCK_NUMBER, unsigned),
            timestamp: resolve(raw, TIMESTAMP, timestamp_seconds),
            from: resolve(raw, FROM, string),
            to: resolve(raw, TO, string),
            token: TransferToken::from_raw(raw),
            amount: resolve(raw, AMOUNT, text),
            transfer_type: resolve(raw, TRANSFER_TYPE, string),
        })
    }
}

/// Output of `getTokenTransfers`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransferPage {
    /// Queried address
    pub address: String,
    /// Cursor this page was requested with
    pub cursor: Option<TransferCursor>,
    /// Cursor for the following page
    pub next_cursor: Option<TransferCursor>,
    /// Transfers in upstream order
    pub items: Vec<TokenTransfer>,
}

/// Fetch one page of transfers
pub async fn run(ctx: &ToolContext, input: TokenTransfersInput) -> ToolResult<TokenTransferPage> {
    let query = input.cursor.map(TransferCursor::to_query);
    let payload = match input.scope {
        TransferScope::Token => ctx.client.token_transfers(&input.address, query).await?,
        TransferScope::Address => {
            ctx.client
                .address_token_transfers(&input.address, query)
                .await?
        }
    };

    Ok(TokenTransferPage {
        address: input.address.to_string(),
        cursor: input.cursor,
        next_cursor: TransferCursor::from_payload(payload.as_value()),
        items: payload
            .items()
            .iter()
            .filter_map(TokenTransfer::from_raw)
            .collect(),
    })
}
