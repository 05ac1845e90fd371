//! Core domain errors and the failure type carried by asynchronous handles.

use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

/// Boxed error cause stored inside a [`TaskError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Core domain errors for JobTrack.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Job not found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Invalid state transition.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Failure of a scheduled computation.
///
/// Every asynchronous handle resolves with either a value or one of these.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The computation raised an error.
    #[error("{message}")]
    Failed {
        /// Short type name of the originating error.
        kind: &'static str,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The caller's wait was abandoned after the given duration.
    #[error("Timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The computation panicked.
    #[error("Task panicked: {0}")]
    Panicked(String),

    /// The runtime dropped the computation before it finished.
    #[error("Task was cancelled")]
    Cancelled,

    /// Work was rejected before it began.
    #[error("{0}")]
    InvalidInput(String),
}

impl TaskError {
    /// Failure with a plain message and no underlying cause.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Failed {
            kind: "Failed",
            message: message.into(),
            source: None,
        }
    }

    /// Wrap any error, remembering its type name.
    pub fn from_error<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Failed {
            kind: short_type_name::<E>(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Rejected input, reported before any work starts.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Wrap this error with a higher-level message, keeping it as the cause.
    pub fn context(self, message: impl Into<String>) -> Self {
        Self::Failed {
            kind: self.kind(),
            message: message.into(),
            source: Some(Box::new(self)),
        }
    }

    /// Kind name used when a failure carries no message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Failed { kind, .. } => *kind,
            Self::Timeout(_) => "Timeout",
            Self::Panicked(_) => "Panicked",
            Self::Cancelled => "Cancelled",
            Self::InvalidInput(_) => "InvalidInput",
        }
    }

    /// Returns true for the timeout kind.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<CoreError> for TaskError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(message) => Self::InvalidInput(message),
            other => Self::from_error(other),
        }
    }
}

impl From<serde_json::Error> for TaskError {
    fn from(err: serde_json::Error) -> Self {
        Self::from_error(err)
    }
}

/// Message of the deepest cause in an error chain.
///
/// Falls back to the cause's kind name when its message is blank. Kind names
/// are only known for [`TaskError`] links, so a foreign error inherits the kind
/// recorded by the nearest `TaskError` that wrapped it.
pub fn root_cause_message(err: &(dyn StdError + 'static)) -> String {
    let mut current = err;
    let mut kind = kind_of(current).unwrap_or("Error");

    while let Some(next) = current.source() {
        current = next;
        if let Some(next_kind) = kind_of(current) {
            kind = next_kind;
        }
    }

    let message = current.to_string();
    if message.trim().is_empty() {
        kind.to_string()
    } else {
        message
    }
}

fn kind_of(err: &(dyn StdError + 'static)) -> Option<&'static str> {
    err.downcast_ref::<TaskError>().map(TaskError::kind)
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
