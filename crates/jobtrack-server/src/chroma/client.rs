//! HTTP client for the ChromaDB REST API.

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info};

use super::error::ChromaError;
use super::types::{
    AddDocumentsRequest, AddDocumentsResponse, Collection, CreateCollectionRequest,
    DeleteDocumentsRequest, DeleteResponse, Metadata, QueryRequest, QueryResponse,
};

const COLLECTIONS: &str = "/api/v1/collections";

/// ChromaDB client.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ChromaClient {
    inner: reqwest::Client,
    base_url: String,
}

impl ChromaClient {
    /// Create a client with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ChromaError> {
        let inner = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        let base_url = base_url.trim_end_matches('/').to_string();

        info!(url = %base_url, timeout_secs = timeout.as_secs(), "ChromaDB client initialized");
        Ok(Self { inner, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ------------------------------------------------------------------
    // Collections
    // ------------------------------------------------------------------

    /// Create a new collection.
    pub async fn create_collection(
        &self,
        name: &str,
        metadata: Metadata,
    ) -> Result<Collection, ChromaError> {
        info!(collection = %name, "Creating collection");
        let body = CreateCollectionRequest::new(name, metadata);
        self.send_json(self.inner.post(self.url(COLLECTIONS)), &body)
            .await
    }

    /// Get a collection by name.
    pub async fn get_collection(&self, name: &str) -> Result<Collection, ChromaError> {
        debug!(collection = %name, "Getting collection");
        let path = format!("{COLLECTIONS}/{name}");
        let response = self.execute(self.inner.get(self.url(&path))).await?;
        decode(response).await
    }

    /// Delete a collection by name.
    pub async fn delete_collection(&self, name: &str) -> Result<bool, ChromaError> {
        info!(collection = %name, "Deleting collection");
        let path = format!("{COLLECTIONS}/{name}");
        self.execute(self.inner.delete(self.url(&path))).await?;
        Ok(true)
    }

    /// List all collections.
    pub async fn list_collections(&self) -> Result<Vec<Collection>, ChromaError> {
        debug!("Listing collections");
        let response = self.execute(self.inner.get(self.url(COLLECTIONS))).await?;
        decode(response).await
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    /// Add documents to a collection, resolving its id by name first.
    pub async fn add_documents(
        &self,
        collection: &str,
        request: &AddDocumentsRequest,
    ) -> Result<AddDocumentsResponse, ChromaError> {
        info!(collection = %collection, count = request.len(), "Adding documents");
        let id = self.get_collection(collection).await?.id;
        let path = format!("{COLLECTIONS}/{id}/add");
        self.send(self.inner.post(self.url(&path)), request).await?;

        Ok(AddDocumentsResponse {
            success: true,
            count: request.len(),
        })
    }

    /// Query a collection for similar documents.
    pub async fn query(
        &self,
        collection: &str,
        request: &QueryRequest,
    ) -> Result<QueryResponse, ChromaError> {
        info!(collection = %collection, n_results = request.n_results, "Querying collection");
        let id = self.get_collection(collection).await?.id;
        let path = format!("{COLLECTIONS}/{id}/query");
        self.send_json(self.inner.post(self.url(&path)), request).await
    }

    /// Delete documents from a collection by id.
    pub async fn delete_documents(
        &self,
        collection: &str,
        request: &DeleteDocumentsRequest,
    ) -> Result<DeleteResponse, ChromaError> {
        info!(collection = %collection, count = request.ids.len(), "Deleting documents");
        let id = self.get_collection(collection).await?.id;
        let path = format!("{COLLECTIONS}/{id}/delete");
        self.send(self.inner.post(self.url(&path)), request).await?;

        Ok(DeleteResponse {
            success: true,
            count: request.ids.len(),
        })
    }

    // ------------------------------------------------------------------
    // HTTP helpers
    // ------------------------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<B: Serialize>(
        &self,
        request: RequestBuilder,
        body: &B,
    ) -> Result<Response, ChromaError> {
        let body = serde_json::to_vec(body).map_err(ChromaError::Encode)?;
        let request = request
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        self.execute(request).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        body: &B,
    ) -> Result<T, ChromaError> {
        let response = self.send(request, body).await?;
        decode(response).await
    }

    /// Send a request and turn error statuses into [`ChromaError::Api`].
    async fn execute(&self, request: RequestBuilder) -> Result<Response, ChromaError> {
        let response = request.send().await.map_err(|e| {
            error!(error = %e, "ChromaDB request failed");
            ChromaError::Http(e)
        })?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "ChromaDB returned an error");
            return Err(ChromaError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ChromaError> {
    let body = response.text().await?;
    debug!(body = %body, "ChromaDB response");
    serde_json::from_str(&body).map_err(|e| {
        error!(error = %e, "Failed to parse ChromaDB response");
        ChromaError::Decode(e)
    })
}
