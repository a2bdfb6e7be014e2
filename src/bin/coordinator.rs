use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

use fleet_lite::config::{self, DispatchConfig, HealthConfig};
use fleet_lite::dispatch::Dispatcher;
use fleet_lite::registry::NodeRegistry;
use fleet_lite::server::{self, AppState};
use fleet_lite::shutdown::shutdown_token;
use fleet_lite::store::JobStore;
use fleet_lite::sweeper::start_health_sweeper;

/// How long in-flight requests get to finish after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "coordinator")]
#[command(about = "Control plane: accepts jobs and dispatches them to agent nodes")]
struct Args {
    /// Listen address; a bare `:port` binds all interfaces
    #[arg(long, env = "COORDINATOR_ADDR", default_value = ":8080")]
    addr: String,

    /// Per-attempt execute RPC timeout
    #[arg(long, env = "DISPATCH_TIMEOUT", default_value = "5s", value_parser = config::parse_duration)]
    dispatch_timeout: Duration,

    /// Execute attempts per dispatch, floored at 1
    #[arg(long, env = "DISPATCH_MAX_ATTEMPTS", default_value_t = 2)]
    dispatch_max_attempts: u32,

    /// Sleep between failed execute attempts
    #[arg(long, env = "DISPATCH_BACKOFF", default_value = "200ms", value_parser = config::parse_duration)]
    dispatch_backoff: Duration,

    /// Heartbeat age after which a node turns SUSPECT
    #[arg(long, env = "SUSPECT_AFTER", default_value = "15s", value_parser = config::parse_duration)]
    suspect_after: Duration,

    /// Heartbeat age after which a node turns OFFLINE
    #[arg(long, env = "OFFLINE_AFTER", default_value = "30s", value_parser = config::parse_duration)]
    offline_after: Duration,

    /// How often node health is recomputed
    #[arg(long, env = "HEALTH_SWEEP_INTERVAL", default_value = "5s", value_parser = config::parse_duration)]
    health_sweep_interval: Duration,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let dispatch_cfg = DispatchConfig::new(
        args.dispatch_timeout,
        args.dispatch_max_attempts,
        args.dispatch_backoff,
    );
    let health_cfg = HealthConfig {
        suspect_after: args.suspect_after,
        offline_after: args.offline_after,
        sweep_interval: args.health_sweep_interval,
    };

    let registry = Arc::new(RwLock::new(NodeRegistry::new()));
    let jobs = Arc::new(RwLock::new(JobStore::new()));
    let dispatcher = Arc::new(Dispatcher::new(registry.clone(), jobs.clone(), dispatch_cfg));

    let sweeper = start_health_sweeper(registry.clone(), health_cfg);

    let app = server::router(AppState {
        registry,
        jobs,
        dispatcher,
    });

    let addr = config::listen_addr(&args.addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "coordinator listening");

    let shutdown = shutdown_token();
    let serve_token = shutdown.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move { serve_token.cancelled().await })
        .into_future();

    let drain_deadline = {
        let shutdown = shutdown.clone();
        async move {
            shutdown.cancelled().await;
            tracing::info!("shutdown signal received, draining");
            tokio::time::sleep(DRAIN_TIMEOUT).await;
        }
    };

    tokio::select! {
        result = server => result?,
        _ = drain_deadline => {
            tracing::warn!("drain window elapsed, abandoning in-flight requests");
        }
    }

    sweeper.cancel();
    Ok(())
}
