// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Usage notes published alongside the tool list

/// Guidance for clients choosing and chaining tools
pub const INSTRUCTIONS: &str = "\
These tools give read-only access to the Base blockchain through the Blockscout explorer API. \
Nothing here signs, sends or simulates transactions.

Use getAccountSummary for a quick view of an address, getTransactions and getTokenTransfers \
to walk its history, getTransactionByHash to inspect a single transaction, getContractABI and \
resolveToken for contract and token metadata, getLogs for raw events, search when only a name \
or partial identifier is known, and getDexRouterActivity to see what is flowing through a DEX \
router. Paginated tools return a nextCursor or nextPage value; pass it back unchanged to \
continue.

Upstream requests are rate limited to roughly 10 per second and short-lived responses are \
cached, so prefer narrow queries and reuse earlier results. Read the structuredContent field \
of each result; the text block holds the same data formatted for display.";
