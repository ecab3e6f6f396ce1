// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Field helpers shared by several tools

use external_apis::normalize::{FieldPath, resolve, string};
use serde::{Deserialize, Serialize};
use serde_json::Value;

static NULL: Value = Value::Null;

/// Sender address given as a string or as an address object
pub const FROM: &[FieldPath] = &[FieldPath::Key("from"), FieldPath::Nested("from", "hash")];
/// Recipient address given as a string or as an address object
pub const TO: &[FieldPath] = &[FieldPath::Key("to"), FieldPath::Nested("to", "hash")];
/// Emitting contract of a log entry
pub const LOG_ADDRESS: &[FieldPath] = &[
    FieldPath::Key("address"),
    FieldPath::Nested("address", "hash"),
];
/// Block number, flat or nested under `block`
pub const BLOCK_NUMBER: &[FieldPath] = &[
    FieldPath::Key("block_number"),
    FieldPath::Key("block"),
    FieldPath::Nested("block", "number"),
];

/// First object found along `paths`, or `null`
pub fn object_at<'a>(item: &'a Value, paths: &[FieldPath]) -> &'a Value {
    resolve(item, paths, |value| value.is_object().then_some(value)).unwrap_or(&NULL)
}

/// String entries of an array, skipping everything else
pub fn strings(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()
        .map(|entries| entries.iter().filter_map(string).collect())
}

/// Normalized transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    /// Executed without reverting
    Success,
    /// Reverted or otherwise failed
    Failed,
    /// Not yet included in a block
    Pending,
}

impl TxStatus {
    /// Interpret an upstream status label
    ///
    /// Labels are matched case-insensitively by substring; `ok` and `error` are the
    /// Blockscout spellings of success and failure.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.to_lowercase();
        if label.contains("success") || label == "ok" {
            Some(Self::Success)
        } else if label.contains("fail") || label.contains("error") {
            Some(Self::Failed)
        } else if label.contains("pending") {
            Some(Self::Pending)
        } else {
            None
        }
    }

    /// First status label along `paths` that can be interpreted
    pub fn resolve(item: &Value, paths: &[FieldPath]) -> Option<Self> {
        resolve(item, paths, |value| value.as_str().and_then(Self::from_label))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn status_labels() {
        assert_eq!(TxStatus::from_label("Success"), Some(TxStatus::Success));
        assert_eq!(TxStatus::from_label("ok"), Some(TxStatus::Success));
        assert_eq!(TxStatus::from_label("failed"), Some(TxStatus::Failed));
        assert_eq!(TxStatus::from_label("error"), Some(TxStatus::Failed));
        assert_eq!(TxStatus::from_label("PENDING"), Some(TxStatus::Pending));
        assert_eq!(TxStatus::from_label("dropped"), None);
    }

    #[test]
    fn status_skips_unreadable_labels() {
        const STATUS: &[FieldPath] = &[FieldPath::Key("status"), FieldPath::Key("result")];
        let item = json!({"status": "unknown", "result": "success"});
        assert_eq!(TxStatus::resolve(&item, STATUS), Some(TxStatus::Success));
    }

    #[test]
    fn object_lookup_falls_back_to_null() {
        const TOKEN: &[FieldPath] = &[FieldPath::Key("token"), FieldPath::Key("contract")];
        let item = json!({"token": "0xabc", "contract": {"symbol": "USDC"}});
        assert_eq!(object_at(&item, TOKEN)["symbol"], "USDC");
        assert!(object_at(&json!({}), TOKEN).is_null());
    }

    #[test]
    fn addresses_accept_objects() {
        let item = json!({"from": {"hash": "0xaaa"}, "to": "0xbbb"});
        assert_eq!(resolve(&item, FROM, string).as_deref(), Some("0xaaa"));
        assert_eq!(resolve(&item, TO, string).as_deref(), Some("0xbbb"));
    }

    #[test]
    fn string_arrays_drop_other_entries() {
        assert_eq!(
            strings(&json!(["0x1", null, 5, "0x2"])),
            Some(vec!["0x1".to_string(), "0x2".to_string()])
        );
        assert_eq!(strings(&json!("0x1")), None);
    }
}
