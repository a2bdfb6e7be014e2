use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::dispatch::Dispatcher;
use crate::registry::{Node, NodeRegistry, NodeState};
use crate::store::{Job, JobStatus, JobStore};

/// Shared state behind every coordinator handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RwLock<NodeRegistry>>,
    pub jobs: Arc<RwLock<JobStore>>,
    pub dispatcher: Arc<Dispatcher>,
}

/// JSON payload agents send to `/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    #[serde(rename = "type", default)]
    pub job_type: String,
    #[serde(default)]
    pub payload: String,
}

/// Error responses for the coordinator API.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(&'static str),
    NotFound(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Build the coordinator router. Unlisted methods on a route answer 405.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/register", post(register_handler))
        .route("/nodes", get(list_nodes_handler))
        .route("/jobs", post(create_job_handler).get(list_jobs_handler))
        .route("/jobs/:id", get(get_job_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "ok"
}

/// POST /register. Each call is both registration and heartbeat.
async fn register_handler(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<Node>, ApiError> {
    if req.id.is_empty() || req.address.is_empty() {
        return Err(ApiError::BadRequest("id and address are required"));
    }

    let node = state.registry.write().await.register(&req.id, &req.address);
    tracing::info!(node_id = %node.id, address = %node.address, "node registered/heartbeat");
    Ok(Json(node))
}

async fn list_nodes_handler(State(state): State<AppState>) -> Json<Vec<Node>> {
    Json(state.registry.read().await.list())
}

/// POST /jobs. The job is stored QUEUED and a dispatcher task is spawned
/// fire-and-forget; the submitter only ever gets the 201 and polls for the
/// rest.
async fn create_job_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Job>), ApiError> {
    if req.job_type.is_empty() {
        return Err(ApiError::BadRequest("type is required"));
    }

    let job = state.jobs.write().await.create(&req.job_type, &req.payload);
    tracing::info!(job_id = %job.id, job_type = %job.job_type, "job created");

    let dispatcher = state.dispatcher.clone();
    let job_id = job.id.clone();
    tokio::spawn(async move {
        dispatcher.dispatch(&job_id).await;
    });

    Ok((StatusCode::CREATED, Json(job)))
}

async fn list_jobs_handler(State(state): State<AppState>) -> Json<Vec<Job>> {
    Json(state.jobs.read().await.list())
}

async fn get_job_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    match state.jobs.read().await.get(&id) {
        Ok(job) => Ok(Json(job)),
        Err(_) => Err(ApiError::NotFound("job not found")),
    }
}

/// GET /metrics: node and job counters plus the observation time.
async fn metrics_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let mut node_counts: HashMap<NodeState, u64> = HashMap::from([
        (NodeState::Healthy, 0),
        (NodeState::Suspect, 0),
        (NodeState::Offline, 0),
    ]);
    for node in state.registry.read().await.list() {
        *node_counts.entry(node.state).or_insert(0) += 1;
    }

    let mut job_counts: HashMap<JobStatus, u64> = HashMap::from([
        (JobStatus::Queued, 0),
        (JobStatus::Running, 0),
        (JobStatus::Completed, 0),
        (JobStatus::Failed, 0),
    ]);
    for job in state.jobs.read().await.list() {
        *job_counts.entry(job.status).or_insert(0) += 1;
    }

    Json(json!({
        "nodes": node_counts,
        "jobs": job_counts,
        "time": Utc::now(),
    }))
}
