// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics module
//!
//! Provides global metrics using the default Prometheus registry via macros and
//! an Axum-compatible metrics handler.

use std::sync::LazyLock;

use api_client::CacheStats;
use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use prometheus::{
    Encoder, Gauge, HistogramVec, IntCounterVec, TextEncoder, register_gauge,
    register_histogram_vec, register_int_counter_vec,
};
use tracing::error;

use crate::state::ServerState;

/// Tool invocations, labeled by tool and result (`ok` or the error kind)
pub static TOOL_INVOCATIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "explorer_tool_invocations_total",
        "Total number of tool invocations, labeled by tool and result",
        &["tool", "result"]
    )
    .expect("Failed to create explorer_tool_invocations_total counter vec")
});

/// Tool invocation durations in seconds
pub static TOOL_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "explorer_tool_duration_seconds",
        "Tool invocation durations in seconds",
        &["tool"],
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("Failed to create tool duration histogram")
});

/// Cache utilization gauge
pub static CACHE_UTILIZATION: LazyLock<Gauge> = LazyLock::new(|| {
    register_gauge!(
        "explorer_cache_utilization_ratio",
        "Current cache utilization as a ratio (0.0 to 1.0)"
    )
    .expect("Failed to create cache utilization gauge")
});

/// Cache hit rate gauge
pub static CACHE_HIT_RATE: LazyLock<Gauge> = LazyLock::new(|| {
    register_gauge!(
        "explorer_cache_hit_rate",
        "Cache hit rate as a ratio (0.0 to 1.0)"
    )
    .expect("Failed to create cache hit rate gauge")
});

/// Cache size gauge
pub static CACHE_SIZE: LazyLock<Gauge> = LazyLock::new(|| {
    register_gauge!(
        "explorer_cache_entries_count",
        "Current number of entries in cache"
    )
    .expect("Failed to create cache size gauge")
});

/// Record one finished tool invocation
///
/// # Arguments
/// * `tool` - Wire name of the tool
/// * `result` - `ok`, or the kind of the error the tool failed with
/// * `duration_secs` - Time spent in the tool
pub fn observe_tool_invocation(tool: &str, result: &str, duration_secs: f64) {
    TOOL_INVOCATIONS.with_label_values(&[tool, result]).inc();
    TOOL_DURATION.with_label_values(&[tool]).observe(duration_secs);
}

/// Copy upstream cache statistics into the cache gauges
pub fn update_cache_metrics(stats: &CacheStats) {
    CACHE_UTILIZATION.set(stats.utilization_rate);
    CACHE_HIT_RATE.set(stats.hit_rate);
    #[allow(clippy::cast_precision_loss)]
    CACHE_SIZE.set(stats.entry_count as f64);
}

/// Axum handler that exports metrics in Prometheus text format
///
/// Cache gauges are refreshed from the live cache before encoding.
pub async fn metrics_handler(State(state): State<ServerState>) -> Response {
    update_cache_metrics(&state.cache_stats());

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    match String::from_utf8(buffer) {
        Ok(body) => ([(header::CONTENT_TYPE, encoder.format_type().to_string())], body).into_response(),
        Err(e) => {
            error!(error = %e, "metrics buffer is not valid UTF-8");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_invocations_are_counted() {
        let before = TOOL_INVOCATIONS
            .with_label_values(&["search", "invalid_input"])
            .get();
        observe_tool_invocation("search", "invalid_input", 0.002);
        assert_eq!(
            TOOL_INVOCATIONS
                .with_label_values(&["search", "invalid_input"])
                .get(),
            before + 1
        );
    }
}
