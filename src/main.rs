//! healthwatch — resource health monitor daemon
//!
//! # Usage
//!
//! ```bash
//! # Run with defaults (redis + postgres on localhost)
//! cargo run --release
//!
//! # Custom bind address and config file
//! cargo run --release -- --addr 0.0.0.0:9000 --config /etc/healthwatch.toml
//! ```
//!
//! # Environment Variables
//!
//! - `BACKEND_URL`: incident backend base URL (default: http://localhost:8080)
//! - `CHECK_INTERVAL`: seconds between scheduler ticks (default: 10)
//! - `HEALTH_THRESHOLD`: unhealthy score threshold (default: 70)
//! - `REDIS_URL` / `DATABASE_URL`: monitored resource URLs
//! - `RUST_LOG`: logging level (default: info)

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use healthwatch::api::{create_app, ApiState};
use healthwatch::config::MonitorConfig;
use healthwatch::monitor::{run_scheduler, MonitorService};
use healthwatch::probes::{PgConnectionPoolProbe, PgTableBloatProbe, Probe, RedisMemoryProbe};
use healthwatch::reporter::HttpReporter;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "healthwatch")]
#[command(about = "Resource health scoring and incident deduplication monitor")]
#[command(version)]
struct CliArgs {
    /// Override the server bind address (default: "0.0.0.0:8002")
    #[arg(short, long)]
    addr: Option<String>,

    /// Path to a TOML config file (default: ./healthwatch.toml)
    #[arg(long)]
    config: Option<String>,

    /// Override the check interval in seconds
    #[arg(long)]
    check_interval: Option<u64>,
}

// ============================================================================
// Task Names for Supervisor Logging
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TaskName {
    HttpServer,
    Scheduler,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskName::HttpServer => write!(f, "HttpServer"),
            TaskName::Scheduler => write!(f, "Scheduler"),
        }
    }
}

// ============================================================================
// Task Spawning
// ============================================================================

fn spawn_http_server(
    task_set: &mut JoinSet<Result<TaskName>>,
    listener: tokio::net::TcpListener,
    app: axum::Router,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        info!("[HttpServer] Task starting");

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await;

        match result {
            Ok(()) => {
                info!("[HttpServer] Graceful shutdown complete");
                Ok(TaskName::HttpServer)
            }
            Err(e) => {
                error!("[HttpServer] Server error: {}", e);
                Err(anyhow::anyhow!("HTTP server error: {}", e))
            }
        }
    });
}

fn spawn_scheduler(
    task_set: &mut JoinSet<Result<TaskName>>,
    monitor: Arc<MonitorService>,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        info!("[Scheduler] Task starting");
        run_scheduler(monitor, interval, cancel_token).await;
        Ok(TaskName::Scheduler)
    });
}

/// Run the supervisor loop: monitor tasks, cancel on failure.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("Supervisor: all tasks spawned, monitoring...");

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("Supervisor: shutdown signal received");
                break;
            }
            result = task_set.join_next() => {
                match result {
                    Some(Ok(Ok(task_name))) => {
                        info!("Supervisor: task {} completed normally", task_name);
                    }
                    Some(Ok(Err(e))) => {
                        error!("Supervisor: task failed with error: {}", e);
                        cancel_token.cancel();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        error!("Supervisor: task panicked: {}", e);
                        cancel_token.cancel();
                        return Err(anyhow::anyhow!("Task panicked: {}", e));
                    }
                    None => {
                        info!("Supervisor: all tasks completed");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let mut config = MonitorConfig::load(args.config.as_deref().map(std::path::Path::new));
    if let Some(interval) = args.check_interval {
        config.monitor.check_interval_secs = interval;
    }
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    config.validate().context("invalid configuration")?;

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  HEALTHWATCH - Resource Health Monitor");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("Backend URL: {}", config.backend.url);
    info!("Check interval: {}s", config.monitor.check_interval_secs);
    info!("Health threshold: {}%", config.monitor.health_threshold);
    info!(
        "Monitoring: {}, {}, {}-bloat",
        config.cache.key, config.database.key, config.database.key
    );
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Statically configured probes, run sequentially in this order each tick.
    let cache_timeout = Duration::from_secs(config.cache.probe_timeout_secs);
    let db_timeout = Duration::from_secs(config.database.probe_timeout_secs);
    let probes: Vec<Box<dyn Probe>> = vec![
        Box::new(RedisMemoryProbe::new(
            config.cache.key.clone(),
            config.cache.url.clone(),
            cache_timeout,
        )),
        Box::new(PgConnectionPoolProbe::new(
            config.database.key.clone(),
            config.database.url.clone(),
            db_timeout,
        )),
        Box::new(PgTableBloatProbe::new(
            format!("{}-bloat", config.database.key),
            config.database.url.clone(),
            db_timeout,
        )),
    ];

    let reporter = HttpReporter::new(
        &config.backend.url,
        Duration::from_secs(config.backend.timeout_secs),
    )
    .context("failed to build incident reporter")?;

    let monitor = Arc::new(MonitorService::new(
        probes,
        Arc::new(reporter),
        config.monitor.health_threshold,
    ));

    let state = ApiState {
        monitor: Arc::clone(&monitor),
        check_interval_secs: config.monitor.check_interval_secs,
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.server.addr))?;
    info!("✓ HTTP server listening on {}", config.server.addr);

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();
    spawn_http_server(&mut task_set, listener, app, cancel_token.clone());
    spawn_scheduler(
        &mut task_set,
        monitor,
        Duration::from_secs(config.monitor.check_interval_secs),
        cancel_token.clone(),
    );

    let result = run_supervisor(&mut task_set, cancel_token.clone()).await;

    // Stop the timer and server before dropping shared state.
    cancel_token.cancel();
    while task_set.join_next().await.is_some() {}

    info!("Shutdown complete");
    result
}
