// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Dispatcher HTTP API
//!
//! `POST /` (and `POST /api/checks`) accepts a JSON object mapping check
//! identifiers to checks and answers with the keyed batch response. A body
//! that does not decode is rejected with 400 before any check runs.

use crate::application::batch::{BatchOrchestrator, CheckBatch};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::debug;

pub struct AppState {
    pub orchestrator: Arc<dyn BatchOrchestrator>,
    pub start_time: Instant,
}

pub fn app(orchestrator: Arc<dyn BatchOrchestrator>) -> Router {
    let state = Arc::new(AppState {
        orchestrator,
        start_time: Instant::now(),
    });

    Router::new()
        .route("/", post(run_batch))
        .route("/api/checks", post(run_batch))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn run_batch(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let checks: CheckBatch = match serde_json::from_slice(&body) {
        Ok(checks) => checks,
        Err(e) => {
            debug!("Rejecting undecodable batch: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("Invalid Request: {}", e) })),
            )
                .into_response();
        }
    };

    let response = state.orchestrator.run_batch(checks).await;
    Json(response).into_response()
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
        "nodes": state.orchestrator.fleet_size(),
    }))
}
