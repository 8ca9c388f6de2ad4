//! HTTP surface over the processor: submit/interrupt/stats/exchange.
//!
//! Handlers push a [`Command`] onto the processor's input queue and then
//! wait for the matching [`Response`] on a per-request oneshot channel; a
//! background thread drains the processor's single output queue and routes
//! each response to the waiter with a matching `request_id`.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::commands::{AlgorithmSelector, Command, CommandContext, Response};
use crate::model::SchedulingSnapshot;
use crate::queue::BoundedQueue;

type Waiters = Arc<Mutex<HashMap<String, oneshot::Sender<Response>>>>;

/// Shared state for the HTTP surface: the processor's input queue, plus the
/// table of in-flight request waiters the response router delivers into.
#[derive(Clone)]
pub struct AppState {
    in_queue: Arc<BoundedQueue<Command>>,
    waiters: Waiters,
}

impl AppState {
    /// Builds app state wired to `in_queue`, and spawns the background
    /// thread that drains `out_queue` and routes each response to its
    /// waiter (dropping responses with no registered waiter, e.g. the
    /// non-originating side of an EXCHANGE).
    pub fn new(in_queue: Arc<BoundedQueue<Command>>, out_queue: Arc<BoundedQueue<Response>>) -> Self {
        let waiters: Waiters = Arc::new(Mutex::new(HashMap::new()));
        spawn_response_router(out_queue, Arc::clone(&waiters));
        Self { in_queue, waiters }
    }

    fn submit(&self, command: Command) -> oneshot::Receiver<Response> {
        let request_id = command.context().request_id.clone();
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().insert(request_id, tx);
        self.in_queue.push(command);
        rx
    }
}

fn spawn_response_router(out_queue: Arc<BoundedQueue<Response>>, waiters: Waiters) {
    thread::spawn(move || loop {
        let response = out_queue.pop();
        if let Some(tx) = waiters.lock().remove(&response.request_id) {
            let _ = tx.send(response);
        }
    });
}

/// Builds the axum router exposing the processor's command surface.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chains", post(schedule))
        .route("/chains/:id/interrupt", post(interrupt))
        .route("/chains/:id/metrics", get(metrics))
        .route("/exchange", post(exchange))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Request body for `POST /chains` (SCHEDULE).
#[derive(Debug, Serialize, Deserialize)]
struct ScheduleRequest {
    chain_id: String,
    algorithms: Vec<AlgorithmSelector>,
    snapshot: SchedulingSnapshot,
}

async fn schedule(State(state): State<AppState>, Json(req): Json<ScheduleRequest>) -> (StatusCode, Json<Response>) {
    let request_id = Uuid::new_v4().to_string();
    tracing::info!(chain_id = %req.chain_id, request_id = %request_id, "SCHEDULE received");
    let command = Command::Schedule {
        context: CommandContext { request_id: request_id.clone() },
        chain_id: req.chain_id,
        algorithms: req.algorithms,
        snapshot: req.snapshot,
    };
    await_response(&state, command).await
}

async fn interrupt(State(state): State<AppState>, Path(chain_id): Path<String>) -> (StatusCode, Json<Response>) {
    let request_id = Uuid::new_v4().to_string();
    tracing::info!(chain_id = %chain_id, request_id = %request_id, "INTERRUPT received");
    let command = Command::Interrupt { context: CommandContext { request_id: request_id.clone() }, chain_id };
    await_response(&state, command).await
}

async fn metrics(State(state): State<AppState>, Path(chain_id): Path<String>) -> (StatusCode, Json<Response>) {
    let request_id = Uuid::new_v4().to_string();
    tracing::info!(chain_id = %chain_id, request_id = %request_id, "METRICS received");
    let command = Command::Metrics { context: CommandContext { request_id: request_id.clone() }, chain_id };
    await_response(&state, command).await
}

/// Request body for `POST /exchange`.
#[derive(Debug, Deserialize)]
struct ExchangeRequest {
    source_chain_id: String,
    target_chain_id: String,
}

async fn exchange(State(state): State<AppState>, Json(req): Json<ExchangeRequest>) -> (StatusCode, Json<Response>) {
    let request_id = Uuid::new_v4().to_string();
    tracing::info!(
        source_chain_id = %req.source_chain_id,
        target_chain_id = %req.target_chain_id,
        request_id = %request_id,
        "EXCHANGE received"
    );
    let command = Command::Exchange {
        context: CommandContext { request_id: request_id.clone() },
        source_chain_id: req.source_chain_id,
        target_chain_id: req.target_chain_id,
    };
    await_response(&state, command).await
}

async fn await_response(state: &AppState, command: Command) -> (StatusCode, Json<Response>) {
    let request_id = command.context().request_id.clone();
    let rx = state.submit(command);
    match rx.await {
        Ok(response) => {
            let code = if response.status { StatusCode::OK } else { StatusCode::UNPROCESSABLE_ENTITY };
            (code, Json(response))
        }
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, Json(Response::empty(request_id, false))),
    }
}
