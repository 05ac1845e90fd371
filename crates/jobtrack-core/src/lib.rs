//! JobTrack Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - An async runtime
//! - Network/HTTP
//! - Storage
//!
//! Everything a caller ever sees about a job (its identifier, status,
//! snapshot, and failure type) lives here.

pub mod error;
pub mod ids;
pub mod job;
pub mod status;

// Re-export commonly used types
pub use error::{root_cause_message, CoreError, TaskError};
pub use ids::JobId;
pub use job::{JobCounts, JobSnapshot};
pub use status::JobStatus;
