// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Base network identifiers
//!
//! The explorer tools read from exactly one network per process. This module
//! provides the type-safe selector used by configuration and routing.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;

/// Supported Base networks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Network {
    /// Base Mainnet - Chain ID: 8453
    #[default]
    BaseMainnet,
    /// Base Sepolia testnet - Chain ID: 84532
    BaseSepolia,
}

impl utoipa::PartialSchema for Network {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        utoipa::openapi::ObjectBuilder::new()
            .schema_type(utoipa::openapi::schema::Type::String)
            .examples(["base-mainnet"])
            .into()
    }
}

impl ToSchema for Network {}

impl Network {
    /// Returns the numeric chain ID
    pub const fn chain_id(self) -> u64 {
        match self {
            Self::BaseMainnet => 8453,
            Self::BaseSepolia => 84532,
        }
    }

    /// Returns the configuration slug of the network
    pub const fn slug(self) -> &'static str {
        match self {
            Self::BaseMainnet => "base-mainnet",
            Self::BaseSepolia => "base-sepolia",
        }
    }

    /// Returns the human-readable name of the network
    pub const fn name(self) -> &'static str {
        match self {
            Self::BaseMainnet => "Base Mainnet",
            Self::BaseSepolia => "Base Sepolia",
        }
    }

    /// Returns whether this is a test network
    pub const fn is_testnet(self) -> bool {
        matches!(self, Self::BaseSepolia)
    }

    /// Returns all supported networks
    pub const fn all() -> &'static [Self] {
        &[Self::BaseMainnet, Self::BaseSepolia]
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Network {
    type Err = NetworkParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<u64>() {
            return Self::try_from(id);
        }

        match s.trim().to_lowercase().as_str() {
            "base-mainnet" | "base" | "mainnet" => Ok(Self::BaseMainnet),
            "base-sepolia" | "sepolia" => Ok(Self::BaseSepolia),
            _ => Err(NetworkParseError::InvalidName(s.to_string())),
        }
    }
}

impl TryFrom<u64> for Network {
    type Error = NetworkParseError;

    fn try_from(id: u64) -> Result<Self, Self::Error> {
        match id {
            8453 => Ok(Self::BaseMainnet),
            84532 => Ok(Self::BaseSepolia),
            _ => Err(NetworkParseError::InvalidId(id)),
        }
    }
}

impl Serialize for Network {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.slug())
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NetworkVisitor;

        impl serde::de::Visitor<'_> for NetworkVisitor {
            type Value = Network;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(
                    formatter,
                    "a network slug (\"base-mainnet\", \"base-sepolia\") or chain ID (8453, 84532)"
                )
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Network::try_from(value).map_err(|_| {
                    E::invalid_value(
                        serde::de::Unexpected::Unsigned(value),
                        &"a supported chain ID (8453, 84532)",
                    )
                })
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let id = u64::try_from(value).map_err(|_| {
                    E::invalid_value(serde::de::Unexpected::Signed(value), &self)
                })?;
                self.visit_u64(id)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Network::from_str(value).map_err(|_| {
                    E::invalid_value(
                        serde::de::Unexpected::Str(value),
                        &"a supported network (base-mainnet, base-sepolia)",
                    )
                })
            }
        }

        deserializer.deserialize_any(NetworkVisitor)
    }
}

/// Error type for network parsing
#[derive(Debug, thiserror::Error)]
pub enum NetworkParseError {
    /// Unknown chain ID
    #[error("unsupported chain ID: {0}. Supported chain IDs are: 8453 (Base Mainnet), 84532 (Base Sepolia)")]
    InvalidId(u64),
    /// Unknown network name
    #[error("unsupported network: {0}. Supported networks are: base-mainnet, base-sepolia")]
    InvalidName(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_round_trip() {
        for &network in Network::all() {
            assert_eq!(network.slug().parse::<Network>().unwrap(), network);
        }
    }

    #[test]
    fn parse_aliases_and_chain_ids() {
        assert_eq!("BASE-SEPOLIA".parse::<Network>().unwrap(), Network::BaseSepolia);
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::BaseMainnet);
        assert_eq!("84532".parse::<Network>().unwrap(), Network::BaseSepolia);
        assert!(matches!(
            "1".parse::<Network>(),
            Err(NetworkParseError::InvalidId(1))
        ));
        assert!(matches!(
            "optimism".parse::<Network>(),
            Err(NetworkParseError::InvalidName(_))
        ));
    }

    #[test]
    fn serde_uses_slug() {
        let json = serde_json::to_string(&Network::BaseSepolia).unwrap();
        assert_eq!(json, "\"base-sepolia\"");

        let parsed: Network = serde_json::from_str("\"base-mainnet\"").unwrap();
        assert_eq!(parsed, Network::BaseMainnet);

        let parsed: Network = serde_json::from_str("84532").unwrap();
        assert_eq!(parsed, Network::BaseSepolia);

        assert!(serde_json::from_str::<Network>("\"arbitrum\"").is_err());
    }

    #[test]
    fn default_is_mainnet() {
        assert_eq!(Network::default(), Network::BaseMainnet);
        assert!(!Network::BaseMainnet.is_testnet());
        assert!(Network::BaseSepolia.is_testnet());
        assert_eq!(Network::BaseMainnet.chain_id(), 8453);
    }
}
