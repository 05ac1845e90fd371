//! HTTP request handlers.

mod chroma;
mod health;
mod hello;
mod jobs;

pub use chroma::{
    add_document, add_documents, advanced_query, create_collection, create_with_documents,
    delete_collection, delete_documents, get_collection, list_collections, query,
};
pub use health::{health_check, metrics_handler};
pub use hello::{start_all, start_compose, start_fallback, start_hello, start_race, start_timeout};
pub use jobs::{cleanup_jobs, filter_jobs, get_job, list_jobs};

use axum::{http::StatusCode, Json};

use jobtrack_core::{JobId, JobStatus};

use crate::http::responses::JobAcceptedResponse;
use crate::state::AppState;

/// 202 response for a freshly submitted job.
fn accepted(state: &AppState, job_id: JobId) -> (StatusCode, Json<JobAcceptedResponse>) {
    let status = state
        .registry
        .get(&job_id)
        .map(|snap| snap.status)
        .unwrap_or(JobStatus::Queued);
    (
        StatusCode::ACCEPTED,
        Json(JobAcceptedResponse::new(job_id, status)),
    )
}
