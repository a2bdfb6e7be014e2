//! Shared helpers for integration tests: condition polling, coordinator
//! fixtures, and fake agent servers with scripted /execute behavior.
#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tokio::sync::RwLock;

use fleet_lite::config::DispatchConfig;
use fleet_lite::dispatch::{Dispatcher, ExecuteRequest};
use fleet_lite::registry::NodeRegistry;
use fleet_lite::server::{self, AppState};
use fleet_lite::store::JobStore;

/// Coordinator state wired the way the binary wires it.
pub fn coordinator_state(dispatch: DispatchConfig) -> AppState {
    let registry = Arc::new(RwLock::new(NodeRegistry::new()));
    let jobs = Arc::new(RwLock::new(JobStore::new()));
    let dispatcher = Arc::new(Dispatcher::new(registry.clone(), jobs.clone(), dispatch));
    AppState {
        registry,
        jobs,
        dispatcher,
    }
}

/// Serve a coordinator on an ephemeral port; returns its bound address.
pub async fn spawn_coordinator(state: AppState) -> SocketAddr {
    let app = server::router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Scripted behavior of a fake agent's /execute endpoint.
#[derive(Clone)]
pub enum AgentScript {
    /// Always answer 200.
    AlwaysOk,
    /// Always answer the given status code.
    AlwaysStatus(u16),
    /// Answer 500 for the first `failures` calls, then 200.
    FailThenOk { failures: usize },
    /// Sleep before answering 200, to trip client-side timeouts.
    Delay(Duration),
}

#[derive(Clone)]
struct FakeAgentState {
    script: AgentScript,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<ExecuteRequest>>>,
}

/// Handle to a running fake agent.
pub struct FakeAgent {
    addr: SocketAddr,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<ExecuteRequest>>>,
}

impl FakeAgent {
    /// The `host:port` form a real agent would register with.
    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.addr.port())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every execute payload received so far, in arrival order.
    pub fn requests(&self) -> Vec<ExecuteRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Spawn a fake agent on an ephemeral port.
pub async fn spawn_fake_agent(script: AgentScript) -> FakeAgent {
    let calls = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = FakeAgentState {
        script,
        calls: calls.clone(),
        requests: requests.clone(),
    };

    let app = Router::new()
        .route("/execute", post(fake_execute_handler))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeAgent {
        addr,
        calls,
        requests,
    }
}

async fn fake_execute_handler(
    State(state): State<FakeAgentState>,
    Json(req): Json<ExecuteRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let call = state.calls.fetch_add(1, Ordering::SeqCst) + 1;
    state.requests.lock().unwrap().push(req);

    let status = match &state.script {
        AgentScript::AlwaysOk => StatusCode::OK,
        AgentScript::AlwaysStatus(code) => {
            StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }
        AgentScript::FailThenOk { failures } => {
            if call <= *failures {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::OK
            }
        }
        AgentScript::Delay(delay) => {
            tokio::time::sleep(*delay).await;
            StatusCode::OK
        }
    };

    (status, Json(serde_json::json!({ "status": "ok" })))
}

/// Wait for a condition to become true, polling until the timeout.
pub async fn wait_for<F, Fut>(condition: F, timeout: Duration, poll_interval: Duration) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = tokio::time::Instant::now();
    while start.elapsed() < timeout {
        if condition().await {
            return true;
        }
        tokio::time::sleep(poll_interval).await;
    }
    false
}

/// Assert a condition eventually becomes true.
pub async fn assert_eventually<F, Fut>(condition: F, timeout: Duration, message: &str)
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let result = wait_for(condition, timeout, Duration::from_millis(25)).await;
    assert!(result, "{}", message);
}
