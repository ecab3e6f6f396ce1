// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Validated path identifiers for explorer resources
//!
//! Addresses, transaction hashes and token contracts all end up as a single URL path
//! segment. [`ResourceId`] guarantees that segment is non-empty, trimmed and contains no
//! characters that would change the request path. Hex identifiers (`0x`-prefixed) are
//! lowercased so that checksummed and lowercase spellings share cache entries.
//!
//! ```rust
//! use external_apis::ResourceId;
//!
//! let router = ResourceId::new(" 0xE592427A0AEce92De3Edee1F18E0157C05861564 ").unwrap();
//! assert_eq!(router.as_str(), "0xe592427a0aece92de3edee1f18e0157c05861564");
//!
//! assert!(ResourceId::new("   ").is_err());
//! assert!(ResourceId::new("0xabc/../logs").is_err());
//! assert!(ResourceId::new("..").is_err());
//! ```

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, de};
use thiserror::Error;

const FORBIDDEN_CHARACTERS: &[char] = &['/', '?', '#', '%', '\\'];

/// Reasons a string cannot be used as a [`ResourceId`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidResourceId {
    /// The identifier is empty or whitespace-only
    #[error("identifier cannot be empty or whitespace-only")]
    Empty,

    /// The identifier contains a character that would alter the request path
    #[error("identifier '{value}' contains forbidden character '{character}'")]
    ForbiddenCharacter {
        /// Rejected input
        value: String,
        /// First offending character
        character: char,
    },

    /// The identifier is `.` or `..`, which URL resolution would collapse
    #[error("identifier '{0}' is a dot segment")]
    DotSegment(String),
}

/// A trimmed, non-empty explorer identifier safe to embed as one path segment
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResourceId(Box<str>);

impl ResourceId {
    /// Validate and normalize an identifier
    ///
    /// Surrounding whitespace is removed and `0x`-prefixed values are lowercased.
    pub fn new(s: impl AsRef<str>) -> Result<Self, InvalidResourceId> {
        let trimmed = s.as_ref().trim();
        if trimmed.is_empty() {
            return Err(InvalidResourceId::Empty);
        }

        if let Some(character) = trimmed
            .chars()
            .find(|c| c.is_whitespace() || FORBIDDEN_CHARACTERS.contains(c))
        {
            return Err(InvalidResourceId::ForbiddenCharacter {
                value: trimmed.to_string(),
                character,
            });
        }

        if matches!(trimmed, "." | "..") {
            return Err(InvalidResourceId::DotSegment(trimmed.to_string()));
        }

        let normalized = if is_hex_prefixed(trimmed) {
            trimmed.to_ascii_lowercase()
        } else {
            trimmed.to_string()
        };

        Ok(Self(normalized.into_boxed_str()))
    }

    /// Normalized identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is `0x`-prefixed
    pub fn is_hex(&self) -> bool {
        is_hex_prefixed(&self.0)
    }
}

fn is_hex_prefixed(value: &str) -> bool {
    value
        .get(..2)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("0x"))
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResourceId {
    type Err = InvalidResourceId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_values_are_lowercased() {
        let id = ResourceId::new("0XABCdef").unwrap();
        assert_eq!(id.as_str(), "0xabcdef");
        assert!(id.is_hex());
    }

    #[test]
    fn non_hex_values_keep_their_case() {
        let id = ResourceId::new("  USDC ").unwrap();
        assert_eq!(id.as_str(), "USDC");
        assert!(!id.is_hex());
    }

    #[test]
    fn rejects_empty_and_path_altering_input() {
        assert_eq!(ResourceId::new(""), Err(InvalidResourceId::Empty));
        assert_eq!(ResourceId::new(" \t"), Err(InvalidResourceId::Empty));
        assert!(matches!(
            ResourceId::new("0xabc?apikey=x"),
            Err(InvalidResourceId::ForbiddenCharacter { character: '?', .. })
        ));
        assert!(ResourceId::new("0x a").is_err());
    }

    #[test]
    fn rejects_dot_segments() {
        assert_eq!(
            ResourceId::new(".."),
            Err(InvalidResourceId::DotSegment("..".to_string()))
        );
        assert_eq!(
            ResourceId::new(" . "),
            Err(InvalidResourceId::DotSegment(".".to_string()))
        );
        assert_eq!(ResourceId::new("...").unwrap().as_str(), "...");
        assert!(serde_json::from_str::<ResourceId>("\"..\"").is_err());
    }

    #[test]
    fn deserializes_with_validation() {
        let id: ResourceId = serde_json::from_str("\"0xAB\"").unwrap();
        assert_eq!(id.to_string(), "0xab");
        assert!(serde_json::from_str::<ResourceId>("\"\"").is_err());
    }
}
