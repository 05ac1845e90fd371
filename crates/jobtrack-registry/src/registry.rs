//! Job registry - maps job identifiers to job state.

use std::cmp::Reverse;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use jobtrack_core::{root_cause_message, JobCounts, JobId, JobSnapshot, TaskError};
use jobtrack_engine::handle::panic_message;
use jobtrack_engine::TaskHandle;

use crate::record::JobRecord;

/// In-memory registry of submitted jobs.
///
/// Safe for any number of concurrent readers. Each job has exactly one
/// writer sequence: `submit` starts it and the completion observer finishes
/// it. Records are sharded across the map and each one carries its own
/// lock, so no operation serializes the whole registry.
///
/// There is no capacity bound; call [`JobRegistry::cleanup`] periodically.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: DashMap<JobId, Arc<JobRecord>>,
    next_seq: AtomicU64,
}

impl JobRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a job and return its identifier without waiting for it.
    ///
    /// `starter` begins the work (usually through the engine) and returns
    /// its handle. The start time is taken just before the starter runs, but
    /// the job is only published as running once the starter has returned a
    /// handle. A starter that returns an error or panics therefore moves the
    /// job straight from queued to failed, recording that error's own
    /// message, and the job is never seen running. Otherwise a completion
    /// observer records the outcome when the handle resolves, reporting the
    /// root cause of any failure.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit<T, S>(&self, name: impl Into<String>, starter: S) -> JobId
    where
        T: Serialize + Send + 'static,
        S: FnOnce() -> Result<TaskHandle<T>, TaskError>,
    {
        let record = self.insert(name.into());
        let id = record.id().clone();
        info!(job_id = %id, name = %record.name(), "Job submitted");

        let started_at = Utc::now();
        let handle = match panic::catch_unwind(AssertUnwindSafe(starter)) {
            Ok(Ok(handle)) => handle,
            Ok(Err(err)) => {
                let message = err.to_string();
                warn!(job_id = %id, error = %message, "Job failed to start");
                Self::record_failure(&record, message);
                return id;
            }
            Err(payload) => {
                let message = panic_message(&*payload);
                warn!(job_id = %id, error = %message, "Job starter panicked");
                Self::record_failure(&record, message);
                return id;
            }
        };

        if let Err(err) = record.start(started_at) {
            warn!(job_id = %id, error = %err, "Job could not be marked running");
        }

        handle.on_complete(move |outcome| {
            let outcome = outcome.and_then(|value| serde_json::to_value(value).map_err(TaskError::from));
            match outcome {
                Ok(result) => {
                    if let Err(err) = record.succeed(result) {
                        warn!(job_id = %record.id(), error = %err, "Dropped job result");
                    } else {
                        info!(job_id = %record.id(), "Job succeeded");
                    }
                }
                Err(err) => {
                    let message = root_cause_message(&err);
                    warn!(job_id = %record.id(), error = %message, "Job failed");
                    Self::record_failure(&record, message);
                }
            }
        });

        id
    }

    /// Submit a job whose handle already yields a JSON value.
    pub fn submit_value<S>(&self, name: impl Into<String>, starter: S) -> JobId
    where
        S: FnOnce() -> Result<TaskHandle<Value>, TaskError>,
    {
        self.submit(name, starter)
    }

    /// Snapshot of a job, or `None` if the id is unknown.
    pub fn get(&self, id: &JobId) -> Option<JobSnapshot> {
        self.jobs.get(id).map(|record| record.snapshot())
    }

    /// Jobs ordered newest first.
    ///
    /// `limit <= 0`, or a limit larger than the number of jobs, returns all
    /// of them.
    pub fn list(&self, limit: i64) -> Vec<JobSnapshot> {
        self.collect(limit, |_| true)
    }

    /// Jobs whose name starts with `prefix`, ordered newest first.
    pub fn list_by_prefix(&self, prefix: &str, limit: i64) -> Vec<JobSnapshot> {
        self.collect(limit, |record| record.name().starts_with(prefix))
    }

    /// Remove terminal jobs that finished more than `max_age` ago.
    ///
    /// Queued and running jobs are never removed. Returns the number of
    /// jobs removed.
    pub fn cleanup(&self, max_age: Duration) -> usize {
        let cutoff = chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age));
        let Some(cutoff) = cutoff else {
            debug!(max_age_secs = max_age.as_secs(), "Cleanup window exceeds clock range");
            return 0;
        };

        let mut removed = 0;
        self.jobs.retain(|_, record| {
            let expired = record.finished_before(cutoff);
            if expired {
                removed += 1;
            }
            !expired
        });

        if removed > 0 {
            info!(removed, "Cleaned up old jobs");
        }
        removed
    }

    /// Number of jobs per status.
    pub fn counts(&self) -> JobCounts {
        let mut counts = JobCounts::default();
        for entry in self.jobs.iter() {
            counts.record(entry.value().status());
        }
        counts
    }

    /// Number of known jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the registry holds no jobs.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn insert(&self, name: String) -> Arc<JobRecord> {
        loop {
            let id = JobId::generate();
            match self.jobs.entry(id) {
                Entry::Occupied(entry) => {
                    warn!(job_id = %entry.key(), "Job id collision, regenerating");
                }
                Entry::Vacant(entry) => {
                    let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                    let record = Arc::new(JobRecord::new(entry.key().clone(), name, seq));
                    entry.insert(Arc::clone(&record));
                    return record;
                }
            }
        }
    }

    fn collect(&self, limit: i64, keep: impl Fn(&JobRecord) -> bool) -> Vec<JobSnapshot> {
        let mut records: Vec<Arc<JobRecord>> = self
            .jobs
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        records.sort_by_key(|record| Reverse((record.created_at(), record.seq())));

        if let Ok(limit) = usize::try_from(limit) {
            if limit > 0 {
                records.truncate(limit);
            }
        }

        records.iter().map(|record| record.snapshot()).collect()
    }

    fn record_failure(record: &JobRecord, message: String) {
        if let Err(err) = record.fail(message) {
            warn!(job_id = %record.id(), error = %err, "Dropped job failure");
        }
    }
}
