//! Error types for the ChromaDB client.

use jobtrack_core::TaskError;
use thiserror::Error;

/// Errors that can occur when talking to ChromaDB.
#[derive(Debug, Error)]
pub enum ChromaError {
    /// ChromaDB answered with an error status.
    #[error("ChromaDB error (status {status}): {body}")]
    Api { status: u16, body: String },

    /// Transport failure (connect, timeout, body read).
    #[error("ChromaDB request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("Failed to parse ChromaDB response: {0}")]
    Decode(#[source] serde_json::Error),

    /// Request body could not be encoded.
    #[error("Failed to encode ChromaDB request: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ChromaError {
    /// HTTP status returned by ChromaDB, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            Self::Decode(_) | Self::Encode(_) => None,
        }
    }
}

impl From<ChromaError> for TaskError {
    fn from(err: ChromaError) -> Self {
        TaskError::from_error(err)
    }
}
