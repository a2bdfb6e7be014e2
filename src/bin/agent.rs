use std::future::IntoFuture;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fleet_lite::agent::heartbeat::{register_with_coordinator, start_heartbeat_loop};
use fleet_lite::agent::server;
use fleet_lite::config;
use fleet_lite::shutdown::shutdown_token;

/// How long in-flight requests get to finish after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "agent")]
#[command(about = "Worker: registers with the coordinator and executes jobs")]
struct Args {
    /// Listen address; a bare `:port` binds all interfaces
    #[arg(long, env = "AGENT_ADDR", default_value = ":8081")]
    addr: String,

    /// Base URL of the coordinator
    #[arg(long, env = "COORDINATOR_URL", default_value = "http://localhost:8080")]
    coordinator_url: String,

    /// Identity reported to the coordinator
    #[arg(long, env = "NODE_ID", default_value_t = config::default_node_id())]
    node_id: String,

    /// How often to re-register with the coordinator
    #[arg(long, env = "HEARTBEAT_INTERVAL", default_value = "10s", value_parser = config::parse_duration)]
    heartbeat_interval: Duration,

    /// Timeout for calls to the coordinator
    #[arg(long, env = "COORD_REQUEST_TIMEOUT", default_value = "5s", value_parser = config::parse_duration)]
    request_timeout: Duration,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let client = reqwest::Client::new();

    // A coordinator that is down at boot is not fatal; the heartbeat loop
    // keeps trying.
    match register_with_coordinator(
        &client,
        &args.coordinator_url,
        &args.node_id,
        &args.addr,
        args.request_timeout,
    )
    .await
    {
        Ok(()) => tracing::info!(node_id = %args.node_id, "registered with coordinator"),
        Err(e) => tracing::warn!(node_id = %args.node_id, error = %e, "initial registration failed"),
    }

    let heartbeat = start_heartbeat_loop(
        client,
        args.coordinator_url.clone(),
        args.node_id.clone(),
        args.addr.clone(),
        args.heartbeat_interval,
        args.request_timeout,
    );

    let app = server::router();
    let addr = config::listen_addr(&args.addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, node_id = %args.node_id, "agent listening");

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

    heartbeat.cancel();
    Ok(())
}
