// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP server bootstrap for the dispatcher and agent node roles
//!
//! Handles:
//! - Configuration loading and validation
//! - Process-wide dispatch pool lifecycle
//! - Optional Prometheus exporter
//! - Graceful shutdown

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use fleetcheck_core::{
    application::{DispatchPool, StandardBatchOrchestrator},
    domain::node_config::FleetConfig,
    infrastructure::{HttpCheckClient, LocalProbe},
    presentation::{agent_api::agent_app, api::app},
};

/// Run the dispatcher until Ctrl+C or SIGTERM.
pub async fn start_dispatcher(
    config_path: Option<PathBuf>,
    host_override: Option<String>,
    port_override: Option<u16>,
) -> Result<()> {
    let mut config = FleetConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    if let Some(host) = host_override {
        config.spec.network.bind_address = host;
    }
    if let Some(port) = port_override {
        config.spec.network.port = port;
    }

    config
        .validate()
        .context("Configuration validation failed")?;

    info!(
        "Configuration loaded: {} ({} nodes, {} workers)",
        config.metadata.name,
        config.nodes().len(),
        config.spec.dispatch.workers
    );

    install_metrics_exporter(&config);

    let dispatch = &config.spec.dispatch;
    let client = HttpCheckClient::with_timeout(dispatch.request_timeout_secs.map(Duration::from_secs))
        .context("Failed to initialize remote check client")?;
    if dispatch.request_timeout_secs.is_none() {
        warn!("No request timeout configured; a hung agent node holds a worker until it answers");
    }

    let pool = DispatchPool::start(dispatch.workers, dispatch.queue_capacity, Arc::new(client));
    let orchestrator = Arc::new(StandardBatchOrchestrator::new(
        Arc::new(config.nodes().to_vec()),
        pool.submitter(),
    ));

    let addr = format!("{}:{}", config.spec.network.bind_address, config.spec.network.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Dispatcher listening on {}", addr);

    // The router owns the last submitter; it is released when serving ends.
    axum::serve(listener, app(orchestrator))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Dispatcher shutting down");
    pool.shutdown().await;

    Ok(())
}

/// Run an agent node serving the per-kind check endpoints.
pub async fn start_agent(host: &str, port: u16) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Agent node listening on {}", addr);

    axum::serve(listener, agent_app(LocalProbe::new()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Agent node shutting down");

    Ok(())
}

fn install_metrics_exporter(config: &FleetConfig) {
    let Some(metrics) = config
        .spec
        .observability
        .as_ref()
        .and_then(|o| o.metrics.as_ref())
        .filter(|m| m.enabled)
    else {
        return;
    };

    let builder = metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], metrics.port));

    match builder.install() {
        Ok(()) => info!("Prometheus metrics exposed on port {}", metrics.port),
        Err(e) => warn!("Failed to install Prometheus exporter: {}", e),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
