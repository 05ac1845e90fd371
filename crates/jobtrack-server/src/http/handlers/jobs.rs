//! Job query handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::{debug, info};

use jobtrack_core::{CoreError, JobId, JobSnapshot};

use crate::error::ServerError;
use crate::http::responses::{
    CleanupParams, CleanupResponse, FilterParams, ListParams, DEFAULT_LIST_LIMIT,
};
use crate::state::AppState;

/// Most recent jobs, newest first.
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Json<Vec<JobSnapshot>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    debug!(limit, "Listing jobs");
    Json(state.registry.list(limit))
}

/// Most recent jobs whose name starts with a prefix.
pub async fn filter_jobs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> Json<Vec<JobSnapshot>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    debug!(prefix = %params.prefix, limit, "Listing jobs by prefix");
    Json(state.registry.list_by_prefix(&params.prefix, limit))
}

/// A single job.
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobSnapshot>, ServerError> {
    let id = JobId::new(id);
    state
        .registry
        .get(&id)
        .map(Json)
        .ok_or_else(|| CoreError::JobNotFound(id.to_string()).into())
}

/// Drop finished jobs older than `max_age_secs` (default: configured retention).
pub async fn cleanup_jobs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CleanupParams>,
) -> Json<CleanupResponse> {
    let max_age = params
        .max_age_secs
        .map(Duration::from_secs)
        .unwrap_or(state.config.job_retention);
    let removed = state.registry.cleanup(max_age);
    info!(removed, max_age_secs = max_age.as_secs(), "Manual job cleanup");
    Json(CleanupResponse { removed })
}
