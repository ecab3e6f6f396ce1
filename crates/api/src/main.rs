// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Base Explorer Tools Server
//!
//! Read-only Base blockchain explorer tools over HTTP. Logging follows `RUST_LOG`,
//! defaulting to `info`.

use anyhow::Context;
use api::{Server, ServerConfig, ShutdownConfig};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServerConfig::from_env().context("loading configuration")?;
    info!(
        environment = %config.environment,
        network = %config.network,
        upstream = %config.upstream_url(),
        "configuration loaded"
    );

    let server = Server::new(config, ShutdownConfig::default()).await?;
    // run on a worker thread rather than the main task
    tokio::spawn(server.run())
        .await
        .context("server task panicked")??;

    Ok(())
}
