// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `search`: free text lookup of addresses, tokens and transactions

use external_apis::normalize::{FieldPath, resolve, string};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{ToolError, ToolResult},
    registry::ToolContext,
};

/// Shortest accepted query, in characters
pub const MIN_QUERY_LENGTH: usize = 2;
/// Most results returned
pub const MAX_RESULTS: usize = 10;

const KIND: &[FieldPath] = &[FieldPath::Key("type")];
const NAME: &[FieldPath] = &[FieldPath::Key("name"), FieldPath::Key("title")];
const HASH: &[FieldPath] = &[FieldPath::Key("hash"), FieldPath::Key("tx_hash")];
const ADDRESS: &[FieldPath] = &[
    FieldPath::Key("address"),
    FieldPath::Key("address_hash"),
    FieldPath::Key("contract_address"),
];
const LABEL: &[FieldPath] = &[FieldPath::Key("label")];
const MATCHED: &[FieldPath] = &[FieldPath::Key("match"), FieldPath::Key("matched_text")];

/// Arguments of `search`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchInput {
    /// Search text
    pub query: String,
}

impl SearchInput {
    fn validate(&self) -> ToolResult<&str> {
        let query = self.query.trim();
        if query.chars().count() < MIN_QUERY_LENGTH {
            return Err(ToolError::invalid(format!(
                "query must be at least {MIN_QUERY_LENGTH} characters"
            )));
        }
        Ok(query)
    }
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    /// Result kind such as `token`, `address` or `transaction`
    #[serde(rename = "type")]
    pub kind: String,
    /// Token or contract name
    pub name: Option<String>,
    /// Transaction or block hash
    pub hash: Option<String>,
    /// Address of the matched account, contract or token
    pub address: Option<String>,
    /// Explorer label
    pub label: Option<String>,
    /// Text that matched the query
    #[serde(rename = "match")]
    pub matched: Option<String>,
}

impl SearchResult {
    /// Normalize a raw hit; the kind defaults to `unknown`
    pub fn from_raw(raw: &Value) -> Self {
        Self {
            kind: resolve(raw, KIND, string).unwrap_or_else(|| "unknown".to_string()),
            name: resolve(raw, NAME, string),
            hash: resolve(raw, HASH, string),
            address: resolve(raw, ADDRESS, string),
            label: resolve(raw, LABEL, string),
            matched: resolve(raw, MATCHED, string),
        }
    }
}

/// Output of `search`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    /// Query as sent upstream
    pub query: String,
    /// First [`MAX_RESULTS`] hits
    pub items: Vec<SearchResult>,
}

/// Run a search
pub async fn run(ctx: &ToolContext, input: SearchInput) -> ToolResult<SearchResults> {
    let query = input.validate()?;
    let payload = ctx.client.search(query).await?;

    Ok(SearchResults {
        query: query.to_string(),
        items: payload
            .items()
            .iter()
            .take(MAX_RESULTS)
            .map(SearchResult::from_raw)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn short_queries_are_rejected() {
        let input = SearchInput {
            query: " a ".to_string(),
        };
        assert!(matches!(
            input.validate(),
            Err(ToolError::InvalidInput { .. })
        ));

        let input = SearchInput {
            query: " ab ".to_string(),
        };
        assert_eq!(input.validate().unwrap(), "ab");
    }

    #[test]
    fn results_are_nullable_with_unknown_kind() {
        let result = SearchResult::from_raw(&json!({"title": "USD Coin", "address_hash": "0xusdc"}));
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            json!({
                "type": "unknown",
                "name": "USD Coin",
                "hash": null,
                "address": "0xusdc",
                "label": null,
                "match": null
            })
        );
    }
}
