// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Declarative field resolution over loosely typed explorer payloads
//!
//! Explorer responses name the same attribute differently across endpoint versions. An
//! attribute is described as an ordered list of [`FieldPath`]s; [`resolve`] walks the list
//! and returns the first value an extractor accepts.
//!
//! ```rust
//! use external_apis::normalize::{FieldPath, resolve, string};
//! use serde_json::json;
//!
//! const SENDER: &[FieldPath] = &[
//!     FieldPath::Key("from"),
//!     FieldPath::Nested("from", "hash"),
//!     FieldPath::Key("sender"),
//! ];
//!
//! let item = json!({"from": {"hash": "0xabc"}});
//! assert_eq!(resolve(&item, SENDER, string).as_deref(), Some("0xabc"));
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

/// Epoch values below this are seconds, values at or above are milliseconds
pub const EPOCH_MILLIS_THRESHOLD: f64 = 1e12;

const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Location of a value inside a JSON object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPath {
    /// Top level key
    Key(&'static str),
    /// Key of an object stored under another key
    Nested(&'static str, &'static str),
}

impl FieldPath {
    /// Value at this path, if present
    pub fn lookup(self, item: &Value) -> Option<&Value> {
        match self {
            Self::Key(key) => item.get(key),
            Self::Nested(outer, inner) => item.get(outer)?.get(inner),
        }
    }
}

/// First value along `paths` that `extract` accepts
pub fn resolve<'a, T>(
    item: &'a Value,
    paths: &[FieldPath],
    extract: impl Fn(&'a Value) -> Option<T>,
) -> Option<T> {
    paths
        .iter()
        .filter_map(|path| path.lookup(item))
        .find_map(extract)
}

/// Any non-null value
pub fn present(value: &Value) -> Option<&Value> {
    (!value.is_null()).then_some(value)
}

/// JSON strings only
pub fn string(value: &Value) -> Option<String> {
    value.as_str().map(ToString::to_string)
}

/// Strings, numbers and booleans rendered as text
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Non-negative integers given as numbers or numeric strings
pub fn unsigned(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Finite numbers given as numbers or numeric strings
pub fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// Objects with at least one key
pub fn non_empty_object(value: &Value) -> Option<&Map<String, Value>> {
    value.as_object().filter(|object| !object.is_empty())
}

/// Arrays
pub fn array(value: &Value) -> Option<&Vec<Value>> {
    value.as_array()
}

/// Epoch milliseconds from a number, numeric string or calendar date
///
/// Numeric values below [`EPOCH_MILLIS_THRESHOLD`] are treated as seconds.
pub fn timestamp_millis(value: &Value) -> Option<i64> {
    if let Some(raw) = epoch_number(value) {
        return scale_to_millis(raw);
    }

    value
        .as_str()
        .and_then(parse_calendar)
        .map(|date| date.timestamp_millis())
}

/// Epoch value kept in its upstream unit; calendar dates become whole seconds
pub fn timestamp_seconds(value: &Value) -> Option<i64> {
    if let Some(raw) = epoch_number(value) {
        return float_to_i64(raw);
    }

    value
        .as_str()
        .and_then(parse_calendar)
        .map(|date| date.timestamp())
}

/// Epoch value exactly as upstream reports it, when numeric
pub fn timestamp_raw(value: &Value) -> Option<i64> {
    epoch_number(value).and_then(float_to_i64)
}

fn epoch_number(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) if s.trim().is_empty() => None,
        _ => number(value),
    }
}

fn scale_to_millis(raw: f64) -> Option<i64> {
    if raw < EPOCH_MILLIS_THRESHOLD {
        float_to_i64(raw * 1000.0)
    } else {
        float_to_i64(raw)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn float_to_i64(raw: f64) -> Option<i64> {
    let rounded = raw.round();
    (rounded.is_finite() && rounded >= i64::MIN as f64 && rounded <= i64::MAX as f64)
        .then(|| rounded as i64)
}

fn parse_calendar(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
        return Some(date.with_timezone(&Utc));
    }
    if let Some(date) = NAIVE_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(date.and_utc());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|date| date.and_utc())
}
