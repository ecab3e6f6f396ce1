// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `getContractABI`: verified ABI and compiler metadata

use api_client::ApiError;
use external_apis::{
    ResourceId,
    normalize::{FieldPath, present, resolve, string},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::ToolResult, registry::ToolContext};

const ABI: &[FieldPath] = &[
    FieldPath::Key("abi"),
    FieldPath::Key("result"),
    FieldPath::Key("abi_json"),
];
const COMPILER: &[FieldPath] = &[
    FieldPath::Key("compiler"),
    FieldPath::Key("compiler_version"),
];
const EVM_VERSION: &[FieldPath] = &[FieldPath::Key("evm"), FieldPath::Key("evm_version")];
const VERIFIED_AT: &[FieldPath] = &[
    FieldPath::Key("verified_at"),
    FieldPath::Key("verification_date"),
];
const VERIFIED: &[FieldPath] = &[FieldPath::Key("verified"), FieldPath::Key("is_verified")];

/// Arguments of `getContractABI`
#[derive(Debug, Clone, Deserialize)]
pub struct ContractAbiInput {
    /// Contract address
    pub address: ResourceId,
}

/// Compiler and verification metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractMetadata {
    /// Compiler version string
    pub compiler: Option<String>,
    /// Target EVM version
    pub evm_version: Option<String>,
    /// When the source was verified
    pub verified_at: Option<String>,
    /// Whether the source is verified; inferred from the ABI when not reported
    pub verified: bool,
}

/// Output of `getContractABI`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractAbi {
    /// Contract address
    pub address: String,
    /// ABI entries, omitted when the contract is not verified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abi: Option<Value>,
    /// Verification metadata
    pub metadata: ContractMetadata,
}

impl ContractAbi {
    /// Normalize a smart-contract payload
    ///
    /// The ABI may be a JSON array or a string holding one. A string that is not valid
    /// JSON is an upstream shape error.
    pub fn from_raw(raw: &Value, address: &ResourceId) -> ToolResult<Self> {
        let abi = match resolve(raw, ABI, present) {
            Some(Value::Array(entries)) => Some(Value::Array(entries.clone())),
            Some(Value::String(encoded)) => Some(serde_json::from_str(encoded).map_err(|e| {
                ApiError::UpstreamShape {
                    message: format!("contract ABI is not valid JSON: {e}"),
                }
            })?),
            _ => None,
        };

        let verified = resolve(raw, VERIFIED, Value::as_bool).unwrap_or(abi.is_some());

        Ok(Self {
            address: address.to_string(),
            metadata: ContractMetadata {
                compiler: resolve(raw, COMPILER, string),
                evm_version: resolve(raw, EVM_VERSION, string),
                verified_at: resolve(raw, VERIFIED_AT, string),
                verified,
            },
            abi,
        })
    }
}

/// Fetch verified contract data
pub async fn run(ctx: &ToolContext, input: ContractAbiInput) -> ToolResult<ContractAbi> {
    let payload = ctx.client.smart_contract(&input.address).await?;
    ContractAbi::from_raw(payload.as_value(), &input.address)
}
