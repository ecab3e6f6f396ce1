// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Blockscout explorer integration for Base
//!
//! This crate wraps the Blockscout v2 REST API on top of the `api-client` request
//! pipeline and adds the pieces that need more than a single request.
//!
//! # Architecture
//!
//! - **Client**: [`blockscout::BlockscoutClient`] - one method per explorer endpoint
//! - **Pagination**: [`cursor`] - keyset cursors and numeric next-page indicators
//! - **Normalization**: [`normalize`] - ordered alias lists resolved over loose payloads
//! - **Router Activity**: [`activity::ActivityScanner`] - multi-page scan with a time cutoff
//! - **Router Directory**: [`routers`] - built-in DEX routers plus file overrides
//! - **Validation Utilities**: [`resource_id::ResourceId`] - safe path identifiers

pub mod activity;
pub mod blockscout;
pub mod cursor;
pub mod normalize;
pub mod resource_id;
pub mod routers;

pub use activity::{
    ActivityItem, ActivityPage, ActivityQuery, ActivityScanner, DecodedCall, ScanState,
    TransactionBatch, TransactionFeed,
};
pub use blockscout::{BlockscoutClient, HEALTH_PROBE_QUERY, ObjectPayload, TokenBalances};
pub use cursor::{CursorValue, NextPage, PageCursor};
pub use resource_id::{InvalidResourceId, ResourceId};
pub use routers::{
    RouterAddresses, RouterConfigError, RouterMap, default_routers, load_router_overrides,
    merge_routers, select_for_network,
};
