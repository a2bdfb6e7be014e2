use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health classification of an agent node, derived from heartbeat age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeState {
    Healthy,
    Suspect,
    Offline,
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeState::Healthy => write!(f, "HEALTHY"),
            NodeState::Suspect => write!(f, "SUSPECT"),
            NodeState::Offline => write!(f, "OFFLINE"),
        }
    }
}

/// An agent node known to the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub address: String,
    pub last_seen: DateTime<Utc>,
    pub state: NodeState,
}

/// In-memory node registry.
///
/// The coordinator holds one registry behind a single lock; every operation
/// here is one critical section and returns owned copies, so callers never
/// alias internal state.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: HashMap<String, Node>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update a node. Registration doubles as a heartbeat: each
    /// call refreshes `last_seen` and resets the node to HEALTHY, and later
    /// registrations of the same id overwrite the address.
    pub fn register(&mut self, id: &str, address: &str) -> Node {
        let node = self.nodes.entry(id.to_string()).or_insert_with(|| Node {
            id: id.to_string(),
            address: String::new(),
            last_seen: Utc::now(),
            state: NodeState::Healthy,
        });
        node.address = address.to_string();
        node.last_seen = Utc::now();
        node.state = NodeState::Healthy;
        node.clone()
    }

    /// Snapshot of all nodes. Iteration order is unspecified.
    pub fn list(&self) -> Vec<Node> {
        self.nodes.values().cloned().collect()
    }

    /// Reclassify every node from the age of its last heartbeat: OFFLINE
    /// past `offline_after`, SUSPECT past `suspect_after`, HEALTHY otherwise.
    /// Both boundaries are strict; a node exactly `suspect_after` old is
    /// still HEALTHY.
    pub fn update_health_states(
        &mut self,
        now: DateTime<Utc>,
        suspect_after: Duration,
        offline_after: Duration,
    ) {
        for node in self.nodes.values_mut() {
            // A heartbeat from the "future" counts as age zero.
            let age = (now - node.last_seen).to_std().unwrap_or_default();
            node.state = if age > offline_after {
                NodeState::Offline
            } else if age > suspect_after {
                NodeState::Suspect
            } else {
                NodeState::Healthy
            };
        }
    }
}
