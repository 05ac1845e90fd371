//! State tracking for a single job.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde_json::Value;

use jobtrack_core::{CoreError, JobId, JobSnapshot, JobStatus};

/// Mutable part of a job.
///
/// Each variant carries exactly the fields that are set in that status, so
/// a terminal transition swaps result/error, status, and finish time in a
/// single assignment.
#[derive(Debug, Clone)]
enum JobState {
    Queued,
    Running {
        started_at: DateTime<Utc>,
    },
    Succeeded {
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        result: Value,
    },
    Failed {
        started_at: Option<DateTime<Utc>>,
        finished_at: DateTime<Utc>,
        error: String,
    },
}

impl JobState {
    fn status(&self) -> JobStatus {
        match self {
            Self::Queued => JobStatus::Queued,
            Self::Running { .. } => JobStatus::Running,
            Self::Succeeded { .. } => JobStatus::Succeeded,
            Self::Failed { .. } => JobStatus::Failed,
        }
    }

    fn started_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Queued => None,
            Self::Running { started_at } | Self::Succeeded { started_at, .. } => Some(*started_at),
            Self::Failed { started_at, .. } => *started_at,
        }
    }

    fn finished_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Succeeded { finished_at, .. } | Self::Failed { finished_at, .. } => {
                Some(*finished_at)
            }
            _ => None,
        }
    }
}

/// A job owned by the registry.
///
/// Identity fields are immutable; the lifecycle state sits behind a
/// per-record lock so readers never observe a half-applied transition.
#[derive(Debug)]
pub(crate) struct JobRecord {
    id: JobId,
    name: String,
    seq: u64,
    created_at: DateTime<Utc>,
    state: RwLock<JobState>,
}

impl JobRecord {
    /// Create a new queued record.
    pub(crate) fn new(id: JobId, name: String, seq: u64) -> Self {
        Self {
            id,
            name,
            seq,
            created_at: Utc::now(),
            state: RwLock::new(JobState::Queued),
        }
    }

    pub(crate) fn id(&self) -> &JobId {
        &self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Submission order, used to break `created_at` ties.
    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }

    pub(crate) fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn status(&self) -> JobStatus {
        self.read(JobState::status)
    }

    /// Mark the job as running.
    pub(crate) fn start(&self, started_at: DateTime<Utc>) -> Result<(), CoreError> {
        self.transition(JobStatus::Running, |_| JobState::Running { started_at })
    }

    /// Mark the job as succeeded.
    pub(crate) fn succeed(&self, result: Value) -> Result<(), CoreError> {
        self.transition(JobStatus::Succeeded, |state| {
            let finished_at = Utc::now();
            JobState::Succeeded {
                started_at: state.started_at().unwrap_or(finished_at),
                finished_at,
                result,
            }
        })
    }

    /// Mark the job as failed, from either queued or running.
    pub(crate) fn fail(&self, error: String) -> Result<(), CoreError> {
        self.transition(JobStatus::Failed, |state| JobState::Failed {
            started_at: state.started_at(),
            finished_at: Utc::now(),
            error,
        })
    }

    /// Whether the job is terminal and finished strictly before `cutoff`.
    pub(crate) fn finished_before(&self, cutoff: DateTime<Utc>) -> bool {
        self.read(|state| state.finished_at().is_some_and(|finished| finished < cutoff))
    }

    /// Copy the current state into an owned snapshot.
    pub(crate) fn snapshot(&self) -> JobSnapshot {
        let state = self.read(JobState::clone);
        let status = state.status();
        let (started_at, finished_at, result, error) = match state {
            JobState::Queued => (None, None, None, None),
            JobState::Running { started_at } => (Some(started_at), None, None, None),
            JobState::Succeeded {
                started_at,
                finished_at,
                result,
            } => (Some(started_at), Some(finished_at), Some(result), None),
            JobState::Failed {
                started_at,
                finished_at,
                error,
            } => (started_at, Some(finished_at), None, Some(error)),
        };

        JobSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            status,
            created_at: self.created_at,
            started_at,
            finished_at,
            result,
            error,
        }
    }

    fn read<R>(&self, f: impl FnOnce(&JobState) -> R) -> R {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Apply `next` if the lifecycle allows moving to `to`.
    fn transition(
        &self,
        to: JobStatus,
        next: impl FnOnce(&JobState) -> JobState,
    ) -> Result<(), CoreError> {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let from = guard.status();
        if !from.can_transition_to(to) {
            return Err(CoreError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        let state = next(&guard);
        *guard = state;
        Ok(())
    }
}
