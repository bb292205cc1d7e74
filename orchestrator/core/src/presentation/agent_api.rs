// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent Node HTTP API
//!
//! Serves the per-kind check endpoints the dispatcher calls. Every successful
//! evaluation answers 200 with `{"Result": bool}`; anything else is a
//! non-success status, which the dispatcher records as errored.

use crate::domain::protocol::{
    AgentResponse, DoesContainRequest, DoesExistRequest, IsRunningRequest, DOES_CONTAIN_ENDPOINT,
    DOES_EXIST_ENDPOINT, IS_RUNNING_ENDPOINT,
};
use crate::infrastructure::probe::LocalProbe;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

pub struct AgentState {
    pub probe: LocalProbe,
}

pub fn agent_app(probe: LocalProbe) -> Router {
    let state = Arc::new(AgentState { probe });

    Router::new()
        .route(&format!("/{}", DOES_EXIST_ENDPOINT), post(does_exist))
        .route(&format!("/{}", DOES_CONTAIN_ENDPOINT), post(does_contain))
        .route(&format!("/{}", IS_RUNNING_ENDPOINT), post(is_running))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn does_exist(
    State(state): State<Arc<AgentState>>,
    Json(request): Json<DoesExistRequest>,
) -> Json<AgentResponse> {
    let result = state.probe.file_exists(&request.path).await;
    Json(AgentResponse { result })
}

async fn does_contain(
    State(state): State<Arc<AgentState>>,
    Json(request): Json<DoesContainRequest>,
) -> Json<AgentResponse> {
    let result = state.probe.file_contains(&request.path, &request.check).await;
    Json(AgentResponse { result })
}

async fn is_running(
    State(state): State<Arc<AgentState>>,
    Json(request): Json<IsRunningRequest>,
) -> Result<Json<AgentResponse>, (StatusCode, String)> {
    match state.probe.is_running(&request.process_name).await {
        Ok(result) => Ok(Json(AgentResponse { result })),
        Err(e) => {
            error!("Process check failed: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
