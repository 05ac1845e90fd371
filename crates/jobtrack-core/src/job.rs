//! Job snapshot types handed to callers.

use crate::{JobId, JobStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Immutable, point-in-time copy of a job's state.
///
/// Owned by the caller; it never changes after being returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    /// Unique job identifier.
    #[serde(rename = "jobId")]
    pub id: JobId,

    /// Caller-supplied label.
    pub name: String,

    /// Status at the instant the snapshot was taken.
    pub status: JobStatus,

    /// When the job record was created.
    pub created_at: DateTime<Utc>,

    /// When the starter began invoking the work.
    pub started_at: Option<DateTime<Utc>>,

    /// When the job reached a terminal status.
    pub finished_at: Option<DateTime<Utc>>,

    /// Result payload, only for succeeded jobs.
    pub result: Option<Value>,

    /// Root-cause message, only for failed jobs.
    pub error: Option<String>,
}

impl JobSnapshot {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

}

/// Number of known jobs per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub queued: u64,
    pub running: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl JobCounts {
    /// Count one job with the given status.
    pub fn record(&mut self, status: JobStatus) {
        match status {
            JobStatus::Queued => self.queued += 1,
            JobStatus::Running => self.running += 1,
            JobStatus::Succeeded => self.succeeded += 1,
            JobStatus::Failed => self.failed += 1,
        }
    }

    /// Total number of jobs counted.
    pub fn total(&self) -> u64 {
        self.queued + self.running + self.succeeded + self.failed
    }
}
