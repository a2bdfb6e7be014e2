use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::dispatch::ExecuteRequest;

/// How long the agent pretends to work on a job before acknowledging it.
const SIMULATED_WORK: Duration = Duration::from_secs(2);

pub fn router() -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/execute", post(execute_handler))
        .layer(TraceLayer::new_for_http())
}

async fn health_handler() -> &'static str {
    "ok"
}

/// POST /execute. Execution is simulated: log the job, sleep, acknowledge.
async fn execute_handler(Json(req): Json<ExecuteRequest>) -> Response {
    if req.job_id.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "job_id is required" })),
        )
            .into_response();
    }

    tracing::info!(job_id = %req.job_id, job_type = %req.job_type, payload = %req.payload, "execute start");
    tokio::time::sleep(SIMULATED_WORK).await;
    tracing::info!(job_id = %req.job_id, "execute complete");

    Json(json!({ "status": "ok" })).into_response()
}
