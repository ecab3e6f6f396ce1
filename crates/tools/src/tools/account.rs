// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `getAccountSummary`: balance, nonce, transaction count and top token balances

use external_apis::{
    ResourceId,
    normalize::{FieldPath, number, resolve, string, text, unsigned},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::format_wei_to_ether;
use tracing::debug;

use crate::{error::ToolResult, registry::ToolContext, tools::common::object_at};

/// Most token balances returned in a summary
pub const MAX_TOKENS: usize = 20;

const ACCOUNT_ADDRESS: &[FieldPath] = &[FieldPath::Key("hash"), FieldPath::Key("address")];
const BALANCE: &[FieldPath] = &[
    FieldPath::Key("balance"),
    FieldPath::Key("coin_balance"),
    FieldPath::Key("value"),
];
const NONCE: &[FieldPath] = &[FieldPath::Key("nonce")];
const COUNTER_TX_COUNT: &[FieldPath] = &[
    FieldPath::Key("transactions_count"),
    FieldPath::Key("tx_count"),
];
const ACCOUNT_TX_COUNT: &[FieldPath] = &[
    FieldPath::Key("tx_count"),
    FieldPath::Key("transaction_count"),
    FieldPath::Key("transactions_count"),
];

const TOKEN_SOURCE: &[FieldPath] = &[
    FieldPath::Key("token"),
    FieldPath::Key("contract"),
    FieldPath::Key("details"),
];
const TOKEN_ADDRESS: &[FieldPath] = &[FieldPath::Key("address"), FieldPath::Key("address_hash")];
const TOKEN_SYMBOL: &[FieldPath] = &[FieldPath::Key("symbol")];
const TOKEN_NAME: &[FieldPath] = &[FieldPath::Key("name")];
const TOKEN_DECIMALS: &[FieldPath] = &[FieldPath::Key("decimals")];
const TOKEN_BALANCE: &[FieldPath] = &[
    FieldPath::Key("balance"),
    FieldPath::Key("value"),
    FieldPath::Key("amount"),
];
const TOKEN_USD: &[FieldPath] = &[
    FieldPath::Key("usd_value"),
    FieldPath::Key("usdPrice"),
    FieldPath::Key("usd"),
];

/// Arguments of `getAccountSummary`
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSummaryInput {
    /// Account address
    pub address: ResourceId,
}

/// Native balance in wei and ether
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeBalance {
    /// Decimal wei amount
    pub wei: String,
    /// Ether amount without trailing zeros
    pub ether: String,
}

/// Token held by the account
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenHolding {
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
    /// Raw balance in the token's smallest unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
    /// Value in USD, when priced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd_value: Option<f64>,
}

impl TokenHolding {
    fn from_raw(raw: &Value) -> Self {
        let token = object_at(raw, TOKEN_SOURCE);
        Self {
            address: resolve(token, TOKEN_ADDRESS, string),
            symbol: resolve(token, TOKEN_SYMBOL, string),
            name: resolve(token, TOKEN_NAME, string),
            decimals: resolve(token, TOKEN_DECIMALS, unsigned).and_then(|d| u32::try_from(d).ok()),
            balance: resolve(raw, TOKEN_BALANCE, text),
            usd_value: resolve(raw, TOKEN_USD, number),
        }
    }
}

/// Output of `getAccountSummary`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    /// Account address as reported upstream
    pub address: String,
    /// Native balance
    pub balance: NativeBalance,
    /// Number of transactions sent or received
    pub transaction_count: u64,
    /// Account nonce, when reported
    pub nonce: Option<u64>,
    /// Up to [`MAX_TOKENS`] token balances in upstream order
    pub token_balances: Vec<TokenHolding>,
}

/// Fetch the account overview, token balances and counters concurrently
pub async fn run(ctx: &ToolContext, input: AccountSummaryInput) -> ToolResult<AccountSummary> {
    let address = &input.address;
    let (account, balances, counters) = tokio::try_join!(
        ctx.client.address(address),
        ctx.client.address_token_balances(address, None),
        ctx.client.address_counters(address),
    )?;

    let account = account.as_value();
    let wei = resolve(account, BALANCE, text).unwrap_or_else(|| "0".to_string());
    let tokens: Vec<TokenHolding> = balances
        .entries()
        .iter()
        .take(MAX_TOKENS)
        .map(TokenHolding::from_raw)
        .collect();

    debug!(address = %address, tokens = tokens.len(), "account summary assembled");

    Ok(AccountSummary {
        address: resolve(account, ACCOUNT_ADDRESS, string)
            .map_or_else(|| address.to_string(), |a| a.to_lowercase()),
        balance: NativeBalance {
            ether: format_wei_to_ether(&wei),
            wei,
        },
        transaction_count: transaction_count(counters.as_value(), account),
        nonce: resolve(account, NONCE, unsigned),
        token_balances: tokens,
    })
}

/// Counter endpoint first, then the account overview, defaulting to zero
fn transaction_count(counters: &Value, account: &Value) -> u64 {
    resolve(counters, COUNTER_TX_COUNT, unsigned)
        .or_else(|| resolve(account, ACCOUNT_TX_COUNT, unsigned))
        .unwrap_or(0)
}
