use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FleetError, Result};

/// Lifecycle state of a job. CANCELLED is reserved; nothing transitions
/// into it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "QUEUED"),
            JobStatus::Running => write!(f, "RUNNING"),
            JobStatus::Completed => write!(f, "COMPLETED"),
            JobStatus::Failed => write!(f, "FAILED"),
            JobStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// The coordinator's view of a unit of work. Payload is opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub payload: String,
    pub status: JobStatus,
    /// Id of the node executing (or that executed) the job.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub node_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// In-memory job store. Mirrors the node registry: a map behind one lock,
/// copies out, ids allocated from a per-store counter and never recycled.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: HashMap<String, Job>,
    next_id: u64,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next `job-<n>` id and store a new QUEUED job.
    pub fn create(&mut self, job_type: &str, payload: &str) -> Job {
        self.next_id += 1;
        let id = format!("job-{}", self.next_id);
        let now = Utc::now();

        let job = Job {
            id: id.clone(),
            job_type: job_type.to_string(),
            payload: payload.to_string(),
            status: JobStatus::Queued,
            node_id: String::new(),
            created_at: now,
            updated_at: now,
        };
        self.jobs.insert(id, job.clone());
        job
    }

    /// Snapshot of all jobs. Order is unspecified.
    pub fn list(&self) -> Vec<Job> {
        self.jobs.values().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Result<Job> {
        self.jobs
            .get(id)
            .cloned()
            .ok_or_else(|| FleetError::JobNotFound(id.to_string()))
    }

    /// Set a job's status. `node_id` is only written when non-empty, so a
    /// terminal update that does not resupply the node keeps the original
    /// assignment.
    pub fn update_status(&mut self, id: &str, status: JobStatus, node_id: &str) -> Result<Job> {
        let job = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| FleetError::JobNotFound(id.to_string()))?;

        job.status = status;
        if !node_id.is_empty() {
            job.node_id = node_id.to_string();
        }
        job.updated_at = Utc::now();

        Ok(job.clone())
    }
}
