// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lifecycle_probe::config::Config;
use lifecycle_probe::kubernetes::{ensure_namespace_exists, Session};
use lifecycle_probe::report::write_results;
use lifecycle_probe::suite::Suite;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting lifecycle probes");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Configuration loaded: namespace={}, kinds={:?}, results_dir={}",
        config.namespace,
        config.kinds,
        config.results_dir.display()
    );

    // Resolve credentials, fatal for the whole suite
    let session = Session::connect(&config)
        .await
        .context("Failed to connect to Kubernetes cluster")?;

    if config.create_namespace {
        ensure_namespace_exists(session.client(), session.namespace())
            .await
            .context("Failed to prepare target namespace")?;
    }

    let reports = Suite::new(session, &config).run().await;

    let results = write_results(&config.results_dir, &reports)
        .context("Failed to write probe results")?;
    info!("Results written to {}", results.display());

    let failed: Vec<String> = reports
        .iter()
        .filter(|r| !r.passed())
        .map(|r| format!("{}/{}", r.kind, r.name))
        .collect();
    if !failed.is_empty() {
        error!("{} of {} probes failed", failed.len(), reports.len());
        anyhow::bail!("Failed probes: {}", failed.join(", "));
    }

    info!("All {} probes passed", reports.len());
    Ok(())
}
