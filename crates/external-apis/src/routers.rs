// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Known DEX router addresses
//!
//! A built-in table covers the routers most swaps on Base go through. Deployments can
//! add or replace entries with a JSON file of the same shape:
//!
//! ```json
//! {
//!   "uniswap_v3": { "mainnet": "0x...", "sepolia": "0x..." }
//! }
//! ```

use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use shared_types::Network;
use thiserror::Error;
use tracing::{debug, info};

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Router addresses per network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterAddresses {
    /// Base mainnet address
    pub mainnet: String,
    /// Base Sepolia address
    pub sepolia: String,
}

impl RouterAddresses {
    /// Address on `network`
    pub fn for_network(&self, network: Network) -> &str {
        match network {
            Network::BaseMainnet => &self.mainnet,
            Network::BaseSepolia => &self.sepolia,
        }
    }
}

/// Router name to per-network addresses
pub type RouterMap = BTreeMap<String, RouterAddresses>;

/// Failures while reading a router override file
#[derive(Debug, Error)]
pub enum RouterConfigError {
    /// The file exists but could not be read
    #[error("failed to read router overrides from {path}: {source}")]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The file is not a valid router map
    #[error("invalid router overrides in {path}: {source}")]
    Parse {
        /// File that was read
        path: PathBuf,
        /// Underlying parse error
        source: serde_json::Error,
    },

    /// An entry has an empty address
    #[error("router '{name}' in {path} has an empty {network} address")]
    EmptyAddress {
        /// File that was read
        path: PathBuf,
        /// Router name
        name: String,
        /// Network whose address is empty
        network: &'static str,
    },
}

/// Built-in router table
pub fn default_routers() -> RouterMap {
    [
        ("uniswap_v3", "0xE592427A0AEce92De3Edee1F18E0157C05861564"),
        ("aerodrome_v2", "0xC5cf4D1AA5CfaF47010AC094d2Eac45B42C4B9c4"),
        ("pancakeswap_v3", "0x6DD655f4dF4A2E80bA1a95B2c98b1EB2D646b2A2"),
    ]
    .into_iter()
    .map(|(name, mainnet)| {
        (
            name.to_string(),
            RouterAddresses {
                mainnet: mainnet.to_string(),
                sepolia: ZERO_ADDRESS.to_string(),
            },
        )
    })
    .collect()
}

/// Overlay `overrides` on `base`; overriding entries replace base entries of the same name
pub fn merge_routers(base: &RouterMap, overrides: Option<&RouterMap>) -> RouterMap {
    let mut merged = base.clone();
    if let Some(overrides) = overrides {
        merged.extend(
            overrides
                .iter()
                .map(|(name, addresses)| (name.clone(), addresses.clone())),
        );
    }
    merged
}

/// Router name to address on `network`
pub fn select_for_network(routers: &RouterMap, network: Network) -> BTreeMap<String, String> {
    routers
        .iter()
        .map(|(name, addresses)| (name.clone(), addresses.for_network(network).to_string()))
        .collect()
}

/// Read router overrides from `path`
///
/// A missing file means no overrides. Any other read failure, malformed JSON or an
/// empty address is an error.
pub async fn load_router_overrides(
    path: impl AsRef<Path>,
) -> Result<Option<RouterMap>, RouterConfigError> {
    let path = path.as_ref();

    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no router override file found");
            return Ok(None);
        }
        Err(source) => {
            return Err(RouterConfigError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let routers: RouterMap =
        serde_json::from_str(&raw).map_err(|source| RouterConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    for (name, addresses) in &routers {
        for (network, address) in [("mainnet", &addresses.mainnet), ("sepolia", &addresses.sepolia)] {
            if address.trim().is_empty() {
                return Err(RouterConfigError::EmptyAddress {
                    path: path.to_path_buf(),
                    name: name.clone(),
                    network,
                });
            }
        }
    }

    info!(path = %path.display(), routers = routers.len(), "loaded router overrides");
    Ok(Some(routers))
}
