//! ChromaDB jobs.
//!
//! Slow operations are started as tracked jobs and return a [`JobId`]
//! immediately. Listing and fetching collections are quick and run inline.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use jobtrack_core::{JobId, TaskError};
use jobtrack_engine::{Executor, TaskHandle};
use jobtrack_registry::JobRegistry;

use crate::chroma::types::{
    AddDocumentsRequest, AddDocumentsResponse, Collection, DeleteDocumentsRequest, Metadata,
    QueryRequest, QueryResponse,
};
use crate::chroma::{ChromaClient, ChromaError};

/// Starts ChromaDB jobs on the I/O pool.
#[derive(Debug, Clone)]
pub struct ChromaService {
    executor: Executor,
    registry: Arc<JobRegistry>,
    client: ChromaClient,
}

impl ChromaService {
    pub fn new(executor: Executor, registry: Arc<JobRegistry>, client: ChromaClient) -> Self {
        Self {
            executor,
            registry,
            client,
        }
    }

    // ------------------------------------------------------------------
    // Collections
    // ------------------------------------------------------------------

    /// Start a job creating a collection.
    pub fn start_create_collection(&self, name: String, metadata: Metadata) -> JobId {
        info!(collection = %name, "Starting create collection job");
        self.registry.submit(format!("chromadb:create:{name}"), || {
            validate_collection_name(&name)?;
            let client = self.client.clone();
            Ok(self.executor.run_io(async move {
                let created = client.create_collection(&name, metadata).await?;
                info!(collection = %name, id = %created.id, "Created collection");
                Ok::<_, TaskError>(created)
            }))
        })
    }

    /// Start a job deleting a collection.
    pub fn start_delete_collection(&self, name: String) -> JobId {
        info!(collection = %name, "Starting delete collection job");
        self.registry.submit(format!("chromadb:delete:{name}"), || {
            validate_collection_name(&name)?;
            let client = self.client.clone();
            Ok(self.executor.run_io(async move {
                Ok::<_, TaskError>(client.delete_collection(&name).await?)
            }))
        })
    }

    pub async fn list_collections(&self) -> Result<Vec<Collection>, ChromaError> {
        self.client.list_collections().await
    }

    pub async fn get_collection(&self, name: &str) -> Result<Collection, ChromaError> {
        self.client.get_collection(name).await
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    /// Start a job adding documents to a collection.
    pub fn start_add_documents(
        &self,
        collection: String,
        ids: Vec<String>,
        documents: Vec<String>,
        metadatas: Option<Vec<Metadata>>,
    ) -> JobId {
        info!(collection = %collection, count = ids.len(), "Starting add documents job");
        self.registry.submit(format!("chromadb:add:{collection}:{}", ids.len()), || {
            validate_collection_name(&collection)?;
            let request = AddDocumentsRequest::new(ids, documents, metadatas)?;
            Ok(self.add(collection, request))
        })
    }

    /// Start a job adding a single document.
    pub fn start_add_document(
        &self,
        collection: String,
        id: String,
        document: String,
        metadata: Option<Metadata>,
    ) -> JobId {
        info!(collection = %collection, "Starting add document job");
        self.registry.submit(format!("chromadb:add:{collection}:1"), || {
            validate_collection_name(&collection)?;
            let request = AddDocumentsRequest::single(id, document, metadata);
            Ok(self.add(collection, request))
        })
    }

    fn add(
        &self,
        collection: String,
        request: AddDocumentsRequest,
    ) -> TaskHandle<AddDocumentsResponse> {
        let client = self.client.clone();
        self.executor.run_io(async move {
            let added = client.add_documents(&collection, &request).await?;
            info!(collection = %collection, count = added.count, "Added documents");
            Ok::<_, TaskError>(added)
        })
    }

    /// Start a job deleting documents by id.
    pub fn start_delete_documents(&self, collection: String, ids: Vec<String>) -> JobId {
        info!(collection = %collection, count = ids.len(), "Starting delete documents job");
        self.registry.submit(format!("chromadb:delete-docs:{collection}"), || {
            validate_collection_name(&collection)?;
            let request = DeleteDocumentsRequest::new(ids)?;
            let client = self.client.clone();
            Ok(self.executor.run_io(async move {
                Ok::<_, TaskError>(client.delete_documents(&collection, &request).await?)
            }))
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Start a job finding the documents most similar to `query_text`.
    pub fn start_query(&self, collection: String, query_text: String, n_results: u32) -> JobId {
        info!(collection = %collection, n_results, "Starting query job");
        self.registry.submit(format!("chromadb:query:{collection}"), || {
            validate_collection_name(&collection)?;
            let request = QueryRequest::text(query_text, n_results)?;
            Ok(self.query(collection, request))
        })
    }

    /// Start a query job with a metadata filter.
    pub fn start_query_advanced(
        &self,
        collection: String,
        query_texts: Vec<String>,
        n_results: u32,
        where_filter: Option<Metadata>,
    ) -> JobId {
        info!(collection = %collection, n_results, "Starting advanced query job");
        self.registry.submit(format!("chromadb:query:{collection}"), || {
            validate_collection_name(&collection)?;
            let request = QueryRequest::advanced(query_texts, n_results, where_filter)?;
            Ok(self.query(collection, request))
        })
    }

    fn query(
        &self,
        collection: String,
        request: QueryRequest,
    ) -> TaskHandle<QueryResponse> {
        let client = self.client.clone();
        self.executor.run_io(async move {
            let response = client.query(&collection, &request).await?;
            info!(collection = %collection, matches = response.matches().len(), "Query returned");
            Ok::<_, TaskError>(response)
        })
    }

    // ------------------------------------------------------------------
    // Composite
    // ------------------------------------------------------------------

    /// Start a job that creates a collection and then fills it.
    ///
    /// Result: `{"collection": <collection>, "documentsAdded": n}`.
    pub fn start_create_with_documents(
        &self,
        name: String,
        collection_metadata: Metadata,
        doc_ids: Vec<String>,
        documents: Vec<String>,
        doc_metadatas: Option<Vec<Metadata>>,
    ) -> JobId {
        info!(collection = %name, count = doc_ids.len(), "Starting create collection with documents");
        self.registry.submit(format!("chromadb:create-with-docs:{name}"), || {
            validate_collection_name(&name)?;
            let request = AddDocumentsRequest::new(doc_ids, documents, doc_metadatas)?;

            let create = self.client.clone();
            let fill = self.client.clone();
            let second = self.executor.clone();
            let create_name = name.clone();

            Ok(self.executor.chain(
                async move {
                    info!(collection = %create_name, "Creating collection");
                    Ok::<_, TaskError>(
                        create.create_collection(&create_name, collection_metadata).await?,
                    )
                },
                move |collection| {
                    second.run_io(async move {
                        info!(collection = %name, count = request.len(), "Adding documents");
                        let added = fill.add_documents(&name, &request).await?;
                        Ok::<_, TaskError>(json!({
                            "collection": collection,
                            "documentsAdded": added.count,
                        }))
                    })
                },
            ))
        })
    }
}

/// Reject names that are empty or would break the request path.
fn validate_collection_name(name: &str) -> Result<(), TaskError> {
    if name.trim().is_empty() {
        return Err(TaskError::invalid_input("collection name must not be empty"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(TaskError::invalid_input(format!(
            "invalid collection name: {name}"
        )));
    }
    Ok(())
}
