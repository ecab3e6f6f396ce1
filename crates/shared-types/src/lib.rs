// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the Base explorer tools
//!
//! This crate provides common types that are shared across multiple crates
//! in the workspace, avoiding circular dependencies.

pub mod network;
pub mod units;

pub use network::{Network, NetworkParseError};
pub use units::format_wei_to_ether;
