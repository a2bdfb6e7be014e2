use std::sync::Arc;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::DispatchConfig;
use crate::error::{FleetError, Result};
use crate::registry::{NodeRegistry, NodeState};
use crate::store::{JobStatus, JobStore};

/// Wire payload POSTed to an agent's `/execute` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub job_id: String,
    #[serde(rename = "type", default)]
    pub job_type: String,
    #[serde(default)]
    pub payload: String,
}

/// Drives one job from QUEUED to a terminal status against one agent.
///
/// Target selection happens exactly once, at claim time; retries stay on the
/// claimed node and do not re-consult its health. A different node would be
/// a different dispatch.
pub struct Dispatcher {
    registry: Arc<RwLock<NodeRegistry>>,
    jobs: Arc<RwLock<JobStore>>,
    client: reqwest::Client,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<RwLock<NodeRegistry>>,
        jobs: Arc<RwLock<JobStore>>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            registry,
            jobs,
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Dispatch one job: pick the first HEALTHY node from a registry
    /// snapshot, claim the job as RUNNING, then run the execute RPC with
    /// bounded retry. Writes at most one terminal status.
    pub async fn dispatch(&self, job_id: &str) {
        let nodes = self.registry.read().await.list();
        let Some(target) = nodes.into_iter().find(|n| n.state == NodeState::Healthy) else {
            tracing::warn!(job_id, event = "no_healthy_nodes", "leaving job queued");
            return;
        };

        let job = match self
            .jobs
            .write()
            .await
            .update_status(job_id, JobStatus::Running, &target.id)
        {
            Ok(job) => job,
            Err(e) => {
                tracing::error!(job_id, node_id = %target.id, error = %e, "failed to mark job running");
                return;
            }
        };

        let url = format!("{}/execute", agent_base_url(&target.address));
        let exec = ExecuteRequest {
            job_id: job.id.clone(),
            job_type: job.job_type.clone(),
            payload: job.payload.clone(),
        };
        // Serialized once up front: a payload that cannot be encoded is not
        // retryable, and the claimed job still has to reach a terminal state.
        let body = match serde_json::to_vec(&exec).map_err(FleetError::from) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(job_id, node_id = %target.id, error = %e, "failed to serialize execute request");
                if let Err(e) = self
                    .jobs
                    .write()
                    .await
                    .update_status(job_id, JobStatus::Failed, &target.id)
                {
                    tracing::error!(job_id, node_id = %target.id, error = %e, "failed to mark job failed");
                }
                return;
            }
        };

        for attempt in 1..=self.config.max_attempts {
            match self.send_execute(&url, body.clone()).await {
                Ok(()) => {
                    tracing::info!(job_id, node_id = %target.id, attempt, "job executed");
                    if let Err(e) = self
                        .jobs
                        .write()
                        .await
                        .update_status(job_id, JobStatus::Completed, &target.id)
                    {
                        tracing::error!(job_id, node_id = %target.id, error = %e, "failed to mark job completed");
                    }
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        job_id,
                        node_id = %target.id,
                        attempt,
                        max_attempts = self.config.max_attempts,
                        error = %e,
                        "execute attempt failed"
                    );
                    if attempt < self.config.max_attempts {
                        tokio::time::sleep(self.config.backoff).await;
                        continue;
                    }
                    if let Err(e) = self
                        .jobs
                        .write()
                        .await
                        .update_status(job_id, JobStatus::Failed, &target.id)
                    {
                        tracing::error!(job_id, node_id = %target.id, error = %e, "failed to mark job failed");
                    }
                    return;
                }
            }
        }
    }

    /// One execute RPC. Success is exactly HTTP 200; connect errors,
    /// timeouts and non-200 responses are a single undifferentiated failure
    /// kind, since the retry policy is uniform.
    async fn send_execute(&self, url: &str, body: Vec<u8>) -> Result<()> {
        let resp = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .timeout(self.config.timeout)
            .send()
            .await?;

        if resp.status() != StatusCode::OK {
            return Err(FleetError::ExecuteRejected(resp.status().as_u16()));
        }
        Ok(())
    }
}

/// Normalize a registered node address into a base URL: full URLs pass
/// through, a bare `:port` targets localhost, anything else gets `http://`.
pub fn agent_base_url(addr: &str) -> String {
    let addr = addr.trim();
    if addr.starts_with("http://") || addr.starts_with("https://") {
        addr.to_string()
    } else if addr.starts_with(':') {
        format!("http://localhost{addr}")
    } else {
        format!("http://{addr}")
    }
}
