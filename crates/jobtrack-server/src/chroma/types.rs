//! ChromaDB wire types.
//!
//! Field names follow the ChromaDB REST API (snake_case).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use jobtrack_core::CoreError;

/// Free-form metadata attached to collections and documents.
pub type Metadata = Map<String, Value>;

/// Fields requested by an advanced query when none are given.
pub const DEFAULT_INCLUDE: [&str; 3] = ["documents", "metadatas", "distances"];

// ============================================================================
// Collections
// ============================================================================

/// A ChromaDB collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

/// Body of `POST /api/v1/collections`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateCollectionRequest {
    pub name: String,

    /// ChromaDB rejects an empty metadata object, so it is omitted instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl CreateCollectionRequest {
    pub fn new(name: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            name: name.into(),
            metadata: (!metadata.is_empty()).then_some(metadata),
        }
    }
}

// ============================================================================
// Documents
// ============================================================================

/// Body of `POST /api/v1/collections/{id}/add`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddDocumentsRequest {
    pub ids: Vec<String>,
    pub documents: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadatas: Option<Vec<Metadata>>,
}

impl AddDocumentsRequest {
    /// Build a request, checking that ids, documents and metadatas line up.
    ///
    /// An empty metadata list is treated as absent.
    pub fn new(
        ids: Vec<String>,
        documents: Vec<String>,
        metadatas: Option<Vec<Metadata>>,
    ) -> Result<Self, CoreError> {
        if ids.is_empty() {
            return Err(CoreError::InvalidInput(
                "at least one document id is required".to_string(),
            ));
        }
        if ids.len() != documents.len() {
            return Err(CoreError::InvalidInput(format!(
                "got {} ids but {} documents",
                ids.len(),
                documents.len()
            )));
        }
        let metadatas = metadatas.filter(|m| !m.is_empty());
        if let Some(metadatas) = &metadatas {
            if metadatas.len() != ids.len() {
                return Err(CoreError::InvalidInput(format!(
                    "got {} ids but {} metadatas",
                    ids.len(),
                    metadatas.len()
                )));
            }
        }

        Ok(Self {
            ids,
            documents,
            metadatas,
        })
    }

    /// Request adding one document.
    pub fn single(id: String, document: String, metadata: Option<Metadata>) -> Self {
        Self {
            ids: vec![id],
            documents: vec![document],
            metadatas: Some(vec![metadata.unwrap_or_default()]),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Result of an add-documents job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddDocumentsResponse {
    pub success: bool,
    pub count: usize,
}

/// Body of `POST /api/v1/collections/{id}/delete`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteDocumentsRequest {
    pub ids: Vec<String>,
}

impl DeleteDocumentsRequest {
    pub fn new(ids: Vec<String>) -> Result<Self, CoreError> {
        if ids.is_empty() {
            return Err(CoreError::InvalidInput(
                "at least one document id is required".to_string(),
            ));
        }
        Ok(Self { ids })
    }
}

/// Result of a delete-documents job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub count: usize,
}

// ============================================================================
// Queries
// ============================================================================

/// Body of `POST /api/v1/collections/{id}/query`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRequest {
    pub query_texts: Vec<String>,
    pub n_results: u32,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_filter: Option<Metadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,
}

impl QueryRequest {
    /// Nearest neighbours of a single text.
    pub fn text(query_text: impl Into<String>, n_results: u32) -> Result<Self, CoreError> {
        Self::build(vec![query_text.into()], n_results, None, None)
    }

    /// Query with a metadata filter, returning documents, metadatas and distances.
    pub fn advanced(
        query_texts: Vec<String>,
        n_results: u32,
        where_filter: Option<Metadata>,
    ) -> Result<Self, CoreError> {
        let include = DEFAULT_INCLUDE.iter().map(|s| s.to_string()).collect();
        Self::build(
            query_texts,
            n_results,
            where_filter.filter(|w| !w.is_empty()),
            Some(include),
        )
    }

    fn build(
        query_texts: Vec<String>,
        n_results: u32,
        where_filter: Option<Metadata>,
        include: Option<Vec<String>>,
    ) -> Result<Self, CoreError> {
        if query_texts.is_empty() || query_texts.iter().all(|t| t.trim().is_empty()) {
            return Err(CoreError::InvalidInput("query text must not be empty".to_string()));
        }
        if n_results == 0 {
            return Err(CoreError::InvalidInput("nResults must be at least 1".to_string()));
        }
        Ok(Self {
            query_texts,
            n_results,
            where_filter,
            include,
        })
    }
}

/// Raw query response: one inner list per query text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub ids: Vec<Vec<String>>,
    #[serde(default)]
    pub documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    pub metadatas: Option<Vec<Vec<Option<Metadata>>>>,
    #[serde(default)]
    pub distances: Option<Vec<Vec<Option<f64>>>>,
}

/// One match of the first query text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryMatch {
    pub id: String,
    pub document: Option<String>,
    pub metadata: Option<Metadata>,
    pub distance: Option<f64>,
}

impl QueryResponse {
    /// Matches for the first query text, zipped across the parallel lists.
    pub fn matches(&self) -> Vec<QueryMatch> {
        let Some(ids) = self.ids.first() else {
            return Vec::new();
        };

        ids.iter()
            .enumerate()
            .map(|(i, id)| QueryMatch {
                id: id.clone(),
                document: nth(&self.documents, i).cloned(),
                metadata: nth(&self.metadatas, i).cloned(),
                distance: nth(&self.distances, i).copied(),
            })
            .collect()
    }
}

fn nth<T>(column: &Option<Vec<Vec<Option<T>>>>, i: usize) -> Option<&T> {
    column.as_ref()?.first()?.get(i)?.as_ref()
}
