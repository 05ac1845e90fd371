//! Greeting job handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use tracing::info;

use crate::error::ServerError;
use crate::http::responses::{NameParams, TimeoutParams, DEFAULT_TIMEOUT_MS};
use crate::state::AppState;

use super::accepted;

pub async fn start_hello(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NameParams>,
) -> impl IntoResponse {
    info!(name = %params.name, "Received request: start hello");
    let id = state.hello.start_hello(&params.name);
    accepted(&state, id)
}

pub async fn start_compose(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NameParams>,
) -> impl IntoResponse {
    info!(name = %params.name, "Received request: start compose");
    let id = state.hello.start_compose(&params.name);
    accepted(&state, id)
}

pub async fn start_race(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    info!("Received request: start race");
    let id = state.hello.start_race();
    accepted(&state, id)
}

pub async fn start_all(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NameParams>,
) -> impl IntoResponse {
    info!(name = %params.name, "Received request: start all");
    let id = state.hello.start_all(&params.name);
    accepted(&state, id)
}

pub async fn start_timeout(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TimeoutParams>,
) -> Result<impl IntoResponse, ServerError> {
    let timeout_ms = params.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
    if timeout_ms == 0 {
        return Err(ServerError::BadRequest(
            "timeout_ms must be greater than zero".to_string(),
        ));
    }
    info!(name = %params.name, timeout_ms, "Received request: start timeout");
    let id = state
        .hello
        .start_timeout(&params.name, Duration::from_millis(timeout_ms));
    Ok(accepted(&state, id))
}

pub async fn start_fallback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NameParams>,
) -> impl IntoResponse {
    info!(name = %params.name, "Received request: start fallback");
    let id = state.hello.start_fallback(&params.name);
    accepted(&state, id)
}
