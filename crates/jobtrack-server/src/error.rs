//! HTTP-facing errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use jobtrack_core::CoreError;

use crate::chroma::ChromaError;
use crate::http::responses::ErrorResponse;

/// Errors returned by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Malformed request.
    #[error("{0}")]
    BadRequest(String),

    /// Domain error surfaced directly.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// ChromaDB failed a synchronous call.
    #[error(transparent)]
    Upstream(#[from] ChromaError),

    /// Startup failure.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::Core(CoreError::JobNotFound(_)) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::Core(CoreError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            Self::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
