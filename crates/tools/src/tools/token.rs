// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `resolveToken`: token contract metadata

use external_apis::{
    ResourceId,
    normalize::{FieldPath, resolve, string, text, unsigned},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::ToolResult, registry::ToolContext};

const NAME: &[FieldPath] = &[FieldPath::Key("name"), FieldPath::Key("token_name")];
const SYMBOL: &[FieldPath] = &[FieldPath::Key("symbol"), FieldPath::Key("token_symbol")];
const DECIMALS: &[FieldPath] = &[FieldPath::Key("decimals"), FieldPath::Key("token_decimals")];
const TOTAL_SUPPLY: &[FieldPath] = &[FieldPath::Key("total_supply"), FieldPath::Key("supply")];
const HOLDERS: &[FieldPath] = &[
    FieldPath::Key("holders"),
    FieldPath::Key("holders_count"),
    FieldPath::Key("holder_count"),
];
const TOKEN_TYPE: &[FieldPath] = &[FieldPath::Key("type"), FieldPath::Key("token_type")];

/// Arguments of `resolveToken`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenInput {
    /// Token contract address
    pub address: ResourceId,
}

/// Output of `resolveToken`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    /// Token contract address
    pub address: String,
    /// Display name
    pub name: Option<String>,
    /// Ticker
    pub symbol: Option<String>,
    /// Decimal places of the smallest unit
    pub decimals: Option<u32>,
    /// Raw total supply in the smallest unit
    pub total_supply: Option<String>,
    /// Number of holding addresses
    pub holders: Option<u64>,
    /// Token standard, e.g. `ERC-20`
    #[serde(rename = "type")]
    pub token_type: Option<String>,
}

impl TokenMetadata {
    /// Normalize a token payload
    pub fn from_raw(raw: &Value, address: &ResourceId) -> Self {
        Self {
            address: address.to_string(),
            name: resolve(raw, NAME, string),
            symbol: resolve(raw, SYMBOL, string),
            decimals: resolve(raw, DECIMALS, unsigned).and_then(|d| u32::try_from(d).ok()),
            total_supply: resolve(raw, TOTAL_SUPPLY, text),
            holders: resolve(raw, HOLDERS, unsigned),
            token_type: resolve(raw, TOKEN_TYPE, string),
        }
    }
}

/// Fetch token metadata
pub async fn run(ctx: &ToolContext, input: TokenInput) -> ToolResult<TokenMetadata> {
    let payload = ctx.client.token(&input.address).await?;
    Ok(TokenMetadata::from_raw(payload.as_value(), &input.address))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn normalizes_blockscout_token() {
        let raw = json!({
            "name": "USD Coin",
            "symbol": "USDC",
            "decimals": "6",
            "total_supply": "1000000000",
            "holders_count": "1234",
            "type": "ERC-20"
        });
        let address = ResourceId::new("0xUSDC").unwrap();

        assert_eq!(
            serde_json::to_value(TokenMetadata::from_raw(&raw, &address)).unwrap(),
            json!({
                "address": "0xusdc",
                "name": "USD Coin",
                "symbol": "USDC",
                "decimals": 6,
                "totalSupply": "1000000000",
                "holders": 1234,
                "type": "ERC-20"
            })
        );
    }

    #[test]
    fn legacy_names_and_missing_fields() {
        let raw = json!({"token_name": "Wrapped Ether", "token_decimals": 18, "holders": "n/a"});
        let metadata = TokenMetadata::from_raw(&raw, &ResourceId::new("0x42").unwrap());
        assert_eq!(metadata.name.as_deref(), Some("Wrapped Ether"));
        assert_eq!(metadata.decimals, Some(18));
        assert_eq!(metadata.holders, None);
        assert_eq!(metadata.symbol, None);
    }
}
