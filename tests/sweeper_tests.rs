mod test_harness;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use fleet_lite::config::HealthConfig;
use fleet_lite::registry::{NodeRegistry, NodeState};
use fleet_lite::sweeper::start_health_sweeper;

use test_harness::assert_eventually;

fn fast_health() -> HealthConfig {
    HealthConfig {
        suspect_after: Duration::from_millis(100),
        offline_after: Duration::from_millis(500),
        sweep_interval: Duration::from_millis(25),
    }
}

async fn node_state(registry: &Arc<RwLock<NodeRegistry>>) -> NodeState {
    registry.read().await.list()[0].state
}

#[tokio::test]
async fn test_sweeper_degrades_silent_nodes() {
    let registry = Arc::new(RwLock::new(NodeRegistry::new()));
    registry.write().await.register("node-1", ":8081");

    let sweeper = start_health_sweeper(registry.clone(), fast_health());

    assert_eventually(
        || async { node_state(&registry).await == NodeState::Suspect },
        Duration::from_secs(2),
        "node never became SUSPECT",
    )
    .await;

    assert_eventually(
        || async { node_state(&registry).await == NodeState::Offline },
        Duration::from_secs(2),
        "node never became OFFLINE",
    )
    .await;

    // A fresh heartbeat revives the node on the next sweep.
    registry.write().await.register("node-1", ":8081");
    assert_eq!(node_state(&registry).await, NodeState::Healthy);

    sweeper.cancel();
}

#[tokio::test]
async fn test_cancelled_sweeper_stops_reclassifying() {
    let registry = Arc::new(RwLock::new(NodeRegistry::new()));
    registry.write().await.register("node-1", ":8081");

    let sweeper = start_health_sweeper(registry.clone(), fast_health());
    sweeper.cancel();

    // Give any straggling tick a chance, then let the node age well past
    // both thresholds: with the sweeper stopped nothing reclassifies it.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(node_state(&registry).await, NodeState::Healthy);
}
