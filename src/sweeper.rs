use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::config::HealthConfig;
use crate::registry::NodeRegistry;

/// Start the background health sweeper.
///
/// Every `sweep_interval` the sweeper reclassifies all nodes from heartbeat
/// age. Outside `register` it is the only writer of node state. The returned
/// token is the stop handle; cancelling it halts the loop promptly and for
/// good.
pub fn start_health_sweeper(
    registry: Arc<RwLock<NodeRegistry>>,
    config: HealthConfig,
) -> CancellationToken {
    let token = CancellationToken::new();
    let loop_token = token.clone();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.sweep_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    registry.write().await.update_health_states(
                        Utc::now(),
                        config.suspect_after,
                        config.offline_after,
                    );
                }
                _ = loop_token.cancelled() => {
                    tracing::info!("health sweeper stopped");
                    return;
                }
            }
        }
    });

    token
}
