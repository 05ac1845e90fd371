//! HTTP request and response types.
//!
//! JSON bodies use camelCase field names.

use serde::{Deserialize, Serialize};

use jobtrack_core::{JobId, JobStatus};

use crate::chroma::types::Metadata;

/// Default page size for job listings.
pub const DEFAULT_LIST_LIMIT: i64 = 20;

/// Default `nResults` for queries.
pub const DEFAULT_N_RESULTS: u32 = 5;

/// Default wait for the timeout demo job.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

// ============================================================================
// Job types
// ============================================================================

/// Response for a job that was accepted for background execution.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAcceptedResponse {
    pub job_id: JobId,

    /// Status observed right after submission.
    pub status: JobStatus,

    /// Where to poll for the outcome.
    pub check_url: String,
}

impl JobAcceptedResponse {
    pub fn new(job_id: JobId, status: JobStatus) -> Self {
        let check_url = format!("/api/jobs/{job_id}");
        Self {
            job_id,
            status,
            check_url,
        }
    }
}

/// Query parameters for `GET /api/jobs`.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

/// Query parameters for `GET /api/jobs/filter`.
#[derive(Debug, Deserialize)]
pub struct FilterParams {
    pub prefix: String,
    pub limit: Option<i64>,
}

/// Query parameters for `POST /api/jobs/cleanup`.
#[derive(Debug, Deserialize)]
pub struct CleanupParams {
    pub max_age_secs: Option<u64>,
}

/// Response for `POST /api/jobs/cleanup`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub removed: usize,
}

// ============================================================================
// Hello types
// ============================================================================

/// Query parameters shared by the greeting endpoints.
#[derive(Debug, Deserialize)]
pub struct NameParams {
    #[serde(default = "default_name")]
    pub name: String,
}

/// Query parameters for the timeout greeting.
#[derive(Debug, Deserialize)]
pub struct TimeoutParams {
    #[serde(default = "default_name")]
    pub name: String,
    pub timeout_ms: Option<u64>,
}

fn default_name() -> String {
    "world".to_string()
}

// ============================================================================
// ChromaDB types
// ============================================================================

/// Body of `POST /api/chromadb/collections`.
#[derive(Debug, Deserialize)]
pub struct CreateCollectionBody {
    pub name: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Body of `POST /api/chromadb/collections/{name}/documents`.
#[derive(Debug, Deserialize)]
pub struct AddDocumentsBody {
    pub ids: Vec<String>,
    pub documents: Vec<String>,
    #[serde(default)]
    pub metadatas: Option<Vec<Metadata>>,
}

/// Body of `POST /api/chromadb/collections/{name}/documents/single`.
#[derive(Debug, Deserialize)]
pub struct SingleDocumentBody {
    pub id: String,
    pub document: String,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

/// Body of `DELETE /api/chromadb/collections/{name}/documents`.
#[derive(Debug, Deserialize)]
pub struct DeleteDocumentsBody {
    pub ids: Vec<String>,
}

/// Body of `POST /api/chromadb/collections/{name}/query`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryBody {
    pub query_text: String,
    pub n_results: Option<u32>,
}

/// Body of `POST /api/chromadb/collections/{name}/query/advanced`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedQueryBody {
    pub query_texts: Vec<String>,
    pub n_results: Option<u32>,
    #[serde(default, rename = "where")]
    pub where_filter: Option<Metadata>,
}

/// Body of `POST /api/chromadb/collections/with-documents`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWithDocumentsBody {
    pub name: String,
    #[serde(default)]
    pub collection_metadata: Metadata,
    pub doc_ids: Vec<String>,
    pub documents: Vec<String>,
    #[serde(default)]
    pub doc_metadatas: Option<Vec<Metadata>>,
}

// ============================================================================
// Error types
// ============================================================================

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
