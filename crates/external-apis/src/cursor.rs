// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Pagination tokens returned by the explorer
//!
//! Keyset endpoints answer with a `next_page_params` object that must be replayed verbatim
//! as query parameters. Offset endpoints answer with a numeric `next_page`. [`NextPage`]
//! covers both so callers can walk either kind of listing.

use std::collections::BTreeMap;

use api_client::QueryParams;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::normalize::{FieldPath, non_empty_object, resolve, unsigned};

const NEXT_PAGE_FIELDS: &[FieldPath] = &[
    FieldPath::Key("next_page_params"),
    FieldPath::Key("next_page"),
    FieldPath::Key("nextPage"),
];

const NEXT_PAGE_NUMBER_FIELDS: &[FieldPath] =
    &[FieldPath::Key("next_page"), FieldPath::Key("nextPage")];

/// Scalar cursor entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CursorValue {
    /// Boolean flag
    Bool(bool),
    /// Numeric position such as a block number or log index
    Number(Number),
    /// Opaque text such as a hash or an encoded value
    Text(String),
}

impl CursorValue {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// Entry as a non-negative integer, accepting numeric text
    pub fn as_u64(&self) -> Option<u64> {
        unsigned(&Value::from(self))
    }
}

impl From<&CursorValue> for Value {
    fn from(value: &CursorValue) -> Self {
        match value {
            CursorValue::Bool(b) => Value::Bool(*b),
            CursorValue::Number(n) => Value::Number(n.clone()),
            CursorValue::Text(s) => Value::String(s.clone()),
        }
    }
}

/// Opaque keyset cursor: a bag of scalar key/value pairs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(BTreeMap<String, CursorValue>);

impl PageCursor {
    /// Keep the scalar entries of `object`; `None` when nothing scalar remains
    pub fn from_object(object: &Map<String, Value>) -> Option<Self> {
        let entries: BTreeMap<_, _> = object
            .iter()
            .filter_map(|(key, value)| CursorValue::from_value(value).map(|v| (key.clone(), v)))
            .collect();

        (!entries.is_empty()).then_some(Self(entries))
    }

    /// Entry stored under `key`
    pub fn get(&self, key: &str) -> Option<&CursorValue> {
        self.0.get(key)
    }

    /// Whether the cursor has an entry for `key`
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the cursor is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CursorValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Entries as query parameters for the follow-up request
    pub fn to_query(&self) -> QueryParams {
        self.iter().map(|(key, value)| (key, Value::from(value))).collect()
    }
}

impl<K: Into<String>> FromIterator<(K, CursorValue)> for PageCursor {
    fn from_iter<I: IntoIterator<Item = (K, CursorValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Continuation reported by a paginated listing
#[derive(Debug, Clone, PartialEq)]
pub enum NextPage {
    /// Keyset cursor to replay as query parameters
    Cursor(PageCursor),
    /// Numeric page indicator, replayed as `page`
    Page(u64),
}

impl NextPage {
    /// Continuation advertised by `payload`, if any
    pub fn from_payload(payload: &Value) -> Option<Self> {
        resolve(payload, NEXT_PAGE_FIELDS, |value| {
            non_empty_object(value)
                .and_then(PageCursor::from_object)
                .map(Self::Cursor)
                .or_else(|| unsigned(value).map(Self::Page))
        })
    }

    /// Query parameters selecting the next page
    pub fn to_query(&self) -> QueryParams {
        match self {
            Self::Cursor(cursor) => cursor.to_query(),
            Self::Page(page) => QueryParams::new().with("page", *page),
        }
    }
}

/// Keyset cursor advertised by `payload`, ignoring numeric indicators
pub fn next_cursor(payload: &Value) -> Option<PageCursor> {
    resolve(payload, NEXT_PAGE_FIELDS, |value| {
        non_empty_object(value).and_then(PageCursor::from_object)
    })
}

/// Numeric next page advertised by `payload`
pub fn next_page_number(payload: &Value) -> Option<u64> {
    resolve(payload, NEXT_PAGE_NUMBER_FIELDS, unsigned)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn keyset_cursor_keeps_only_scalars() {
        let payload = json!({
            "items": [],
            "next_page_params": {"block_number": 10, "index": 2, "hash": "0xa", "nested": {"x": 1}, "none": null}
        });

        let next = NextPage::from_payload(&payload);
        let Some(NextPage::Cursor(cursor)) = &next else {
            unreachable!("expected keyset cursor, got {next:?}");
        };

        assert_eq!(cursor.len(), 3);
        assert_eq!(cursor.get("block_number").and_then(CursorValue::as_u64), Some(10));
        assert!(!cursor.contains_key("nested"));
        assert_eq!(
            cursor.to_query().get("hash"),
            Some(&json!("0xa"))
        );
    }

    #[test]
    fn numeric_indicator_becomes_page_parameter() {
        let next = NextPage::from_payload(&json!({"next_page": "3"})).unwrap();
        assert_eq!(next, NextPage::Page(3));
        assert_eq!(next.to_query().get("page"), Some(&json!(3)));

        assert_eq!(next_page_number(&json!({"nextPage": 4})), Some(4));
        assert_eq!(next_page_number(&json!({"next_page": null})), None);
    }

    #[test]
    fn missing_or_empty_cursor_means_no_continuation() {
        assert_eq!(NextPage::from_payload(&json!({"items": []})), None);
        assert_eq!(NextPage::from_payload(&json!({"next_page_params": null})), None);
        assert_eq!(NextPage::from_payload(&json!({"next_page_params": {}})), None);
        assert_eq!(next_cursor(&json!({"next_page": 2})), None);
    }

    #[test]
    fn cursor_round_trips_through_json() {
        let cursor: PageCursor =
            serde_json::from_value(json!({"block_number": 5, "filter": "to", "fee": true})).unwrap();
        assert_eq!(cursor.get("filter"), Some(&CursorValue::Text("to".into())));
        assert_eq!(cursor.get("fee"), Some(&CursorValue::Bool(true)));

        assert!(serde_json::from_value::<PageCursor>(json!({"bad": [1]})).is_err());
    }
}
