// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Query parameter bag for upstream requests

use serde::Serialize;
use serde_json::Value;

/// Ordered set of query parameters
///
/// Keys are unique; inserting an existing key replaces its value in place. Null values
/// are kept in the bag but never rendered into a URL or a cache key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryParams {
    entries: Vec<(String, Value)>,
}

impl QueryParams {
    /// Create an empty parameter bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Insert a parameter only when the key is not already present
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        if !self.contains_key(&key) {
            self.entries.push((key, value.into()));
        }
    }

    /// Insert a parameter when a value is present
    pub fn insert_opt<V: Into<Value>>(&mut self, key: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder-style optional insert
    #[must_use]
    pub fn with_opt<V: Into<Value>>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.insert_opt(key, value);
        self
    }

    /// Look up a raw parameter value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find_map(|(existing, value)| (existing == key).then_some(value))
    }

    /// Whether a key is present, null or not
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == key)
    }

    /// Number of parameters, including null ones
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bag holds no parameters
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy every parameter of `other` into this bag, replacing existing keys
    pub fn merge(&mut self, other: &QueryParams) {
        for (key, value) in &other.entries {
            self.insert(key.clone(), value.clone());
        }
    }

    /// Non-null parameters rendered as strings, in insertion order
    pub fn rendered(&self) -> impl Iterator<Item = (&str, String)> {
        self.entries
            .iter()
            .filter_map(|(key, value)| render(value).map(|rendered| (key.as_str(), rendered)))
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut params = QueryParams::new().with("filter", "to").with("page", 1);
        params.insert("filter", "from");

        let rendered: Vec<_> = params.rendered().collect();
        assert_eq!(
            rendered,
            vec![("filter", "from".to_string()), ("page", "1".to_string())]
        );
    }

    #[test]
    fn nulls_are_kept_but_not_rendered() {
        let params = QueryParams::new()
            .with("address", Value::Null)
            .with("page_size", 50)
            .with("verified", true);

        assert_eq!(params.len(), 3);
        assert!(params.contains_key("address"));
        let rendered: Vec<_> = params.rendered().collect();
        assert_eq!(
            rendered,
            vec![
                ("page_size", "50".to_string()),
                ("verified", "true".to_string())
            ]
        );
    }

    #[test]
    fn insert_if_absent_keeps_existing_value() {
        let mut params = QueryParams::new().with("filter", "from");
        params.insert_if_absent("filter", "to");
        params.insert_if_absent("page", 2);
        assert_eq!(params.get("filter"), Some(&json!("from")));
        assert_eq!(params.get("page"), Some(&json!(2)));
    }

    #[test]
    fn optional_values_are_skipped() {
        let params = QueryParams::new()
            .with_opt("from_block", None::<u64>)
            .with_opt("to_block", Some(10_u64));
        assert!(!params.contains_key("from_block"));
        assert_eq!(params.get("to_block"), Some(&json!(10)));
    }
}
