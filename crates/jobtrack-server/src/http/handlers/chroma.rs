//! ChromaDB handlers.
//!
//! Writes and queries return 202 with a job id; listing and fetching
//! collections answer inline.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use tracing::{debug, info, warn};

use crate::chroma::types::Collection;
use crate::error::ServerError;
use crate::http::responses::{
    AddDocumentsBody, AdvancedQueryBody, CreateCollectionBody, CreateWithDocumentsBody,
    DeleteDocumentsBody, QueryBody, SingleDocumentBody, DEFAULT_N_RESULTS,
};
use crate::state::AppState;

use super::accepted;

pub async fn create_collection(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateCollectionBody>,
) -> impl IntoResponse {
    info!(collection = %body.name, "Received request: create collection");
    let id = state.chroma.start_create_collection(body.name, body.metadata);
    accepted(&state, id)
}

pub async fn list_collections(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Collection>>, ServerError> {
    debug!("Listing collections");
    Ok(Json(state.chroma.list_collections().await?))
}

pub async fn get_collection(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Collection>, ServerError> {
    debug!(collection = %name, "Getting collection");
    state.chroma.get_collection(&name).await.map(Json).map_err(|e| {
        warn!(collection = %name, error = %e, "Collection lookup failed");
        ServerError::NotFound(format!("Collection not found: {name}"))
    })
}

pub async fn delete_collection(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    info!(collection = %name, "Received request: delete collection");
    let id = state.chroma.start_delete_collection(name);
    accepted(&state, id)
}

pub async fn add_documents(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(body): Json<AddDocumentsBody>,
) -> impl IntoResponse {
    info!(collection = %name, count = body.ids.len(), "Received request: add documents");
    let id = state
        .chroma
        .start_add_documents(name, body.ids, body.documents, body.metadatas);
    accepted(&state, id)
}

pub async fn add_document(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(body): Json<SingleDocumentBody>,
) -> impl IntoResponse {
    info!(collection = %name, "Received request: add document");
    let id = state
        .chroma
        .start_add_document(name, body.id, body.document, body.metadata);
    accepted(&state, id)
}

pub async fn delete_documents(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(body): Json<DeleteDocumentsBody>,
) -> impl IntoResponse {
    info!(collection = %name, count = body.ids.len(), "Received request: delete documents");
    let id = state.chroma.start_delete_documents(name, body.ids);
    accepted(&state, id)
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(body): Json<QueryBody>,
) -> impl IntoResponse {
    info!(collection = %name, query = %body.query_text, "Received request: query");
    let id = state.chroma.start_query(
        name,
        body.query_text,
        body.n_results.unwrap_or(DEFAULT_N_RESULTS),
    );
    accepted(&state, id)
}

pub async fn advanced_query(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(body): Json<AdvancedQueryBody>,
) -> impl IntoResponse {
    info!(collection = %name, "Received request: advanced query");
    let id = state.chroma.start_query_advanced(
        name,
        body.query_texts,
        body.n_results.unwrap_or(DEFAULT_N_RESULTS),
        body.where_filter,
    );
    accepted(&state, id)
}

pub async fn create_with_documents(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateWithDocumentsBody>,
) -> impl IntoResponse {
    info!(
        collection = %body.name,
        count = body.doc_ids.len(),
        "Received request: create collection with documents"
    );
    let id = state.chroma.start_create_with_documents(
        body.name,
        body.collection_metadata,
        body.doc_ids,
        body.documents,
        body.doc_metadatas,
    );
    accepted(&state, id)
}
