// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Router activity scanner
//!
//! Walks the inbound transaction listing of a router contract page by page until enough
//! items are collected for the requested window, the listing is exhausted, or the listing
//! has moved past the optional time cutoff. Collected items are normalized into
//! [`ActivityItem`]s, filtered against the cutoff and sliced into the requested page.
//!
//! Batches are assumed to arrive newest first: once the last item of a batch is older
//! than the cutoff, later batches can only be older still and are not fetched.

use std::future::Future;

use api_client::{ApiResult, QueryParams};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    blockscout::BlockscoutClient,
    cursor::NextPage,
    normalize::{FieldPath, array, non_empty_object, resolve, string, timestamp_millis},
    resource_id::ResourceId,
};

/// Page size used when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Largest page the scanner serves
pub const MAX_PAGE_SIZE: u32 = 100;

const TIMESTAMP: &[FieldPath] = &[FieldPath::Key("timestamp"), FieldPath::Key("block_timestamp")];
const DECODED_SOURCE: &[FieldPath] = &[
    FieldPath::Key("decoded_input"),
    FieldPath::Key("decoded"),
    FieldPath::Key("method_details"),
];
const DECODED_NAME: &[FieldPath] = &[
    FieldPath::Key("name"),
    FieldPath::Key("method_call"),
    FieldPath::Key("method"),
];
const DECODED_SIGNATURE: &[FieldPath] = &[
    FieldPath::Key("signature"),
    FieldPath::Key("method_id"),
    FieldPath::Key("selector"),
];
const DECODED_PARAMS: &[FieldPath] = &[
    FieldPath::Key("params"),
    FieldPath::Key("parameters"),
    FieldPath::Key("arguments"),
];
const SENDER: &[FieldPath] = &[
    FieldPath::Key("from"),
    FieldPath::Nested("from", "hash"),
    FieldPath::Key("sender"),
];
const METHOD: &[FieldPath] = &[FieldPath::Key("method"), FieldPath::Key("input_method")];
const VALUE: &[FieldPath] = &[FieldPath::Key("value"), FieldPath::Key("amount")];
const HASH: &[FieldPath] = &[FieldPath::Key("hash"), FieldPath::Key("tx_hash")];

/// One page of raw transactions and the continuation after it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionBatch {
    /// Raw upstream entries, newest first
    pub items: Vec<Value>,
    /// Continuation, `None` when the listing is exhausted
    pub next: Option<NextPage>,
}

/// Source of inbound transaction batches for an address
pub trait TransactionFeed {
    /// Fetch the batch selected by `next`, or the first batch when `next` is `None`
    fn fetch_batch(
        &self,
        address: &ResourceId,
        next: Option<&NextPage>,
    ) -> impl Future<Output = ApiResult<TransactionBatch>> + Send;
}

impl TransactionFeed for BlockscoutClient {
    async fn fetch_batch(
        &self,
        address: &ResourceId,
        next: Option<&NextPage>,
    ) -> ApiResult<TransactionBatch> {
        let mut query = QueryParams::new().with("filter", "to");
        if let Some(next) = next {
            query.merge(&next.to_query());
        }

        let payload = self.address_transactions(address, Some(query)).await?;
        Ok(TransactionBatch {
            items: payload.items().to_vec(),
            next: payload.next_page(),
        })
    }
}

/// Parameters of one scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    /// Router contract address
    pub router: ResourceId,
    /// Only keep transactions from the last N minutes
    pub since_minutes: Option<u32>,
    /// One-based page number
    pub page: u32,
    /// Items per page
    pub page_size: u32,
}

impl ActivityQuery {
    /// First page of default size, no cutoff
    pub fn new(router: ResourceId) -> Self {
        Self {
            router,
            since_minutes: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Restrict to the last `minutes`
    #[must_use]
    pub fn since_minutes(mut self, minutes: u32) -> Self {
        self.since_minutes = Some(minutes);
        self
    }

    /// Select a page; zero is treated as the first page
    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Set the page size, clamped to `1..=MAX_PAGE_SIZE`
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    fn window(&self) -> (usize, usize) {
        let page = self.page.max(1) as usize;
        let size = self.page_size.clamp(1, MAX_PAGE_SIZE) as usize;
        ((page - 1) * size, page * size)
    }

    fn cutoff_millis(&self, now_millis: i64) -> Option<i64> {
        self.since_minutes
            .map(|minutes| now_millis.saturating_sub(i64::from(minutes) * 60_000))
    }
}

/// Progress of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// More batches are needed
    Collecting,
    /// Upstream has no further batches
    Exhausted,
    /// Enough items are collected, or the listing moved past the cutoff
    Sufficient,
}

/// Decoded call data of a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedCall {
    /// Method name
    pub name: Option<String>,
    /// Method signature or selector
    pub signature: Option<String>,
    /// Decoded parameters
    pub params: Option<Vec<Value>>,
}

impl DecodedCall {
    /// Read name, signature and parameters from a decoded-input object
    pub fn from_source(source: &Value) -> Self {
        Self {
            name: resolve(source, DECODED_NAME, string),
            signature: resolve(source, DECODED_SIGNATURE, string),
            params: resolve(source, DECODED_PARAMS, array).cloned(),
        }
    }

    /// Whether nothing could be decoded
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.signature.is_none() && self.params.is_none()
    }
}

/// Normalized router transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    /// Transaction hash, empty when upstream omitted it
    pub hash: String,
    /// Sender address
    pub from: Option<String>,
    /// Method label
    pub method: Option<String>,
    /// Decoded call data
    pub decoded: Option<DecodedCall>,
    /// Epoch milliseconds
    pub timestamp: Option<i64>,
    /// Native value in wei
    pub value: Option<String>,
}

impl ActivityItem {
    /// Normalize a raw upstream entry; non-object entries yield `None`
    pub fn from_raw(raw: &Value) -> Option<Self> {
        raw.as_object()?;

        let decoded = resolve(raw, DECODED_SOURCE, |source| {
            non_empty_object(source).map(|_| source)
        })
        .map(DecodedCall::from_source);
        let method = resolve(raw, METHOD, string)
            .or_else(|| decoded.as_ref().and_then(|call| call.name.clone()));

        Some(Self {
            hash: resolve(raw, HASH, string).unwrap_or_default(),
            from: resolve(raw, SENDER, string),
            method,
            decoded,
            timestamp: raw_timestamp(raw),
            value: resolve(raw, VALUE, string),
        })
    }
}

fn raw_timestamp(raw: &Value) -> Option<i64> {
    resolve(raw, TIMESTAMP, timestamp_millis)
}

/// Requested page of router activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPage {
    /// Router address that was scanned
    pub router: String,
    /// One-based page number
    pub page: u32,
    /// Items per page
    pub page_size: u32,
    /// Cutoff in minutes, if any
    pub since_minutes: Option<u32>,
    /// Items of the requested page, in upstream order
    pub items: Vec<ActivityItem>,
    /// Whether items exist beyond this page
    pub has_more: bool,
}

/// Scanner over a [`TransactionFeed`]
#[derive(Debug, Clone)]
pub struct ActivityScanner<F> {
    feed: F,
}

impl<F: TransactionFeed> ActivityScanner<F> {
    /// Create a scanner reading from `feed`
    pub fn new(feed: F) -> Self {
        Self { feed }
    }

    /// Scan relative to the current time
    pub async fn scan(&self, query: &ActivityQuery) -> ApiResult<ActivityPage> {
        self.scan_at(query, Utc::now().timestamp_millis()).await
    }

    /// Scan relative to `now_millis`
    ///
    /// Any batch failure aborts the scan and is returned unchanged.
    pub async fn scan_at(&self, query: &ActivityQuery, now_millis: i64) -> ApiResult<ActivityPage> {
        let cutoff = query.cutoff_millis(now_millis);
        let (start, end) = query.window();

        let mut collected: Vec<Value> = Vec::new();
        let mut next: Option<NextPage> = None;
        let mut passed_cutoff = false;
        let mut batches = 0_usize;
        let mut state = ScanState::Collecting;

        while state == ScanState::Collecting {
            let batch = self.feed.fetch_batch(&query.router, next.as_ref()).await?;
            batches += 1;

            let batch_is_empty = batch.items.is_empty();
            passed_cutoff = match (cutoff, batch.items.last().and_then(raw_timestamp)) {
                (Some(cutoff), Some(oldest)) => oldest < cutoff,
                _ => false,
            };

            collected.extend(batch.items);
            next = batch.next;

            state = if batch_is_empty || next.is_none() {
                ScanState::Exhausted
            } else if collected.len() >= end || passed_cutoff {
                ScanState::Sufficient
            } else {
                ScanState::Collecting
            };
        }

        let items: Vec<ActivityItem> = collected
            .iter()
            .filter_map(ActivityItem::from_raw)
            .filter(|item| match cutoff {
                Some(cutoff) => item.timestamp.is_some_and(|timestamp| timestamp >= cutoff),
                None => true,
            })
            .collect();

        let unfetched = state == ScanState::Sufficient && !passed_cutoff;
        let has_more = items.len() > end || unfetched;

        debug!(
            router = %query.router,
            batches,
            collected = collected.len(),
            kept = items.len(),
            state = ?state,
            "router activity scan finished"
        );

        Ok(ActivityPage {
            router: query.router.to_string(),
            page: query.page.max(1),
            page_size: query.page_size.clamp(1, MAX_PAGE_SIZE),
            since_minutes: query.since_minutes,
            items: items.into_iter().skip(start).take(end - start).collect(),
            has_more,
        })
    }
}
