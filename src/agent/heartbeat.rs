use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{FleetError, Result};

#[derive(Debug, Serialize)]
struct RegisterPayload<'a> {
    id: &'a str,
    address: &'a str,
}

/// POST this agent's identity to the coordinator. The coordinator treats
/// every call as a heartbeat, so this is both first registration and
/// keep-alive.
pub async fn register_with_coordinator(
    client: &reqwest::Client,
    coordinator_url: &str,
    node_id: &str,
    address: &str,
    timeout: Duration,
) -> Result<()> {
    let url = format!("{coordinator_url}/register");
    let resp = client
        .post(&url)
        .json(&RegisterPayload {
            id: node_id,
            address,
        })
        .timeout(timeout)
        .send()
        .await?;

    if resp.status() != reqwest::StatusCode::OK {
        return Err(FleetError::RegisterRejected(resp.status().as_u16()));
    }
    Ok(())
}

/// Re-register with the coordinator every `interval` to stay HEALTHY.
/// Failed heartbeats are logged and dropped; the next tick tries again.
/// Cancelling the returned token stops the loop.
pub fn start_heartbeat_loop(
    client: reqwest::Client,
    coordinator_url: String,
    node_id: String,
    address: String,
    interval: Duration,
    timeout: Duration,
) -> CancellationToken {
    let token = CancellationToken::new();
    let loop_token = token.clone();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The caller already registered once at startup; skip the immediate
        // first tick so the loop starts one full interval later.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match register_with_coordinator(&client, &coordinator_url, &node_id, &address, timeout).await {
                        Ok(()) => tracing::debug!(node_id = %node_id, "heartbeat ok"),
                        Err(e) => tracing::warn!(node_id = %node_id, error = %e, "heartbeat failed"),
                    }
                }
                _ = loop_token.cancelled() => {
                    tracing::info!("heartbeat loop stopped");
                    return;
                }
            }
        }
    });

    token
}
