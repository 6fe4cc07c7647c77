//! Standalone mode: in-memory scheduler, AM service and RPC endpoint
//! in one process.
//!
//! Startup order:
//! 1. Load and validate the config file
//! 2. Wire scheduler → node event channel → AM service
//! 3. Start the node event loop
//! 4. Seed nodes and attempts from `[standalone]`
//! 5. Serve `/rpc/{protocol}/{method}` until Ctrl-C

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info};

use opal_allocator::{ContainerTokenIssuer, DigestTokenIssuer};
use opal_core::{NodeId, NodeRecord, OpalConfig, Resource};
use opal_rpc::{ProtocolRouter, build_router};
use opal_service::{AmService, InMemoryScheduler, node_event_channel, run_node_events};

pub async fn run_standalone(config_path: PathBuf, port: Option<u16>) -> anyhow::Result<()> {
    info!("Opal daemon starting in standalone mode");

    let mut config = OpalConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if let Some(port) = port {
        config.server.port = port;
    }
    info!(path = ?config_path, "configuration loaded");

    // ── Wiring ─────────────────────────────────────────────────

    let tokens: Arc<dyn ContainerTokenIssuer> = Arc::new(DigestTokenIssuer::new(&config.token.secret));
    let (events_tx, events_rx) = node_event_channel(config.events.channel_capacity);
    let scheduler = Arc::new(InMemoryScheduler::new(tokens.clone()).with_events(events_tx));
    let service = Arc::new(AmService::from_config(&config, scheduler.clone(), tokens));
    info!(
        nodes_used = config.allocation.nodes_used,
        sizing = ?config.sizing(),
        "AM service initialized"
    );

    // ── Background tasks ───────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let events_handle = tokio::spawn(run_node_events(service.clone(), events_rx, shutdown_rx));

    // ── Seed the scheduler ─────────────────────────────────────

    for node in &config.standalone.nodes {
        let record = NodeRecord::new(
            NodeId::new(&node.host, node.port),
            format!("{}:{}", node.host, node.http_port),
            Resource::new(node.memory_mb, node.vcores),
        )
        .with_partition(&node.partition);
        scheduler.add_node(record).await;
    }
    for attempt in &config.standalone.attempts {
        let queue = attempt.queue.as_deref().unwrap_or(&config.standalone.queue);
        scheduler.submit_attempt(attempt.attempt_id(), queue);
    }
    info!(
        nodes = config.standalone.nodes.len(),
        attempts = config.standalone.attempts.len(),
        "standalone scheduler seeded"
    );

    // ── RPC server ─────────────────────────────────────────────

    let router = ProtocolRouter::new(service, config.distributed_scheduling.enabled);
    let app = build_router(Arc::new(router));
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind))?;

    info!(%addr, distributed_scheduling = config.distributed_scheduling.enabled, "RPC server starting");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    let _ = events_handle.await;

    info!("Opal daemon stopped");
    Ok(())
}
