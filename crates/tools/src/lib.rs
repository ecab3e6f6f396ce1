// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Read-only Base explorer tools
//!
//! Each tool validates a JSON argument object, calls the Blockscout client and folds the
//! loosely shaped upstream payload into a stable output record. The [`ToolRegistry`] is the
//! single entry point: it looks a tool up by name, runs it and wraps the result in a
//! [`ToolOutcome`] that carries both a human readable text block and the structured record.
//!
//! # Tools
//!
//! | name | purpose |
//! |---|---|
//! | `getAccountSummary` | balance, nonce, transaction count and top token balances |
//! | `getTransactions` | paginated transactions of an address |
//! | `getTransactionByHash` | one transaction with decoded call data and logs |
//! | `getContractABI` | verified ABI and compiler metadata |
//! | `getTokenTransfers` | paginated transfers of a token |
//! | `search` | free text search |
//! | `getLogs` | event logs by address, topics and block range |
//! | `getDexRouterActivity` | recent calls into a DEX router |
//! | `resolveToken` | token metadata |

pub mod error;
pub mod instructions;
pub mod registry;
pub mod tools;

pub use error::{ToolError, ToolResult};
pub use instructions::INSTRUCTIONS;
pub use registry::{
    Invocation, ToolContent, ToolContext, ToolDescriptor, ToolName, ToolOutcome, ToolRegistry,
    UnknownToolName,
};
