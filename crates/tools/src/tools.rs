// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Tool implementations
//!
//! Every module exposes an input type, an output record and an async `run` function
//! taking the shared [`ToolContext`](crate::ToolContext).

pub mod account;
pub mod common;
pub mod contract;
pub mod logs;
pub mod router_activity;
pub mod search;
pub mod token;
pub mod transaction;
pub mod transactions;
pub mod transfers;
