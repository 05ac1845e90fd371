//! Two-pool executor and the combinators built on it.
//!
//! CPU-bound closures run on the runtime's blocking threads behind a
//! semaphore sized to the available parallelism. I/O-bound futures run as
//! plain runtime tasks with no concurrency bound, so any number of waiting
//! network calls never takes a CPU slot.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{select_all, try_join_all};
use tokio::sync::Semaphore;
use tracing::{debug, info};

use jobtrack_core::TaskError;

use crate::handle::{join_error, TaskHandle};

/// Executor configuration.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of CPU-bound closures running at once.
    pub cpu_workers: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        let parallelism = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        Self {
            cpu_workers: parallelism.max(4),
        }
    }
}

/// Runs computations without blocking the caller and composes their handles.
///
/// Cheap to clone; clones share the same CPU pool.
#[derive(Debug, Clone)]
pub struct Executor {
    cpu_pool: Arc<Semaphore>,
    cpu_workers: usize,
    closed: Arc<AtomicBool>,
}

impl Executor {
    /// Create a new Executor.
    pub fn new(config: ExecutorConfig) -> Self {
        let cpu_workers = config.cpu_workers.max(1);
        info!(cpu_workers, "Executor initialized");
        Self {
            cpu_pool: Arc::new(Semaphore::new(cpu_workers)),
            cpu_workers,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Size of the CPU pool.
    pub fn cpu_workers(&self) -> usize {
        self.cpu_workers
    }

    /// CPU slots not currently in use.
    pub fn cpu_permits_available(&self) -> usize {
        self.cpu_pool.available_permits()
    }

    /// Stop accepting work.
    ///
    /// Computations already scheduled keep running, including CPU work still
    /// waiting for a free slot.
    pub fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("Executor shutting down");
        }
    }

    /// Whether [`Executor::shutdown`] has been called.
    pub fn is_shutdown(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    /// Run a CPU-bound closure on the bounded pool.
    pub fn run<T, F>(&self, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, TaskError> + Send + 'static,
    {
        if self.is_shutdown() {
            return TaskHandle::failed(TaskError::Cancelled);
        }
        let pool = Arc::clone(&self.cpu_pool);
        TaskHandle::spawn(async move {
            let _permit = pool
                .acquire_owned()
                .await
                .map_err(|_| TaskError::Cancelled)?;
            match tokio::task::spawn_blocking(task).await {
                Ok(outcome) => outcome,
                Err(err) => Err(join_error(err)),
            }
        })
    }

    /// Run an I/O-bound future on the unbounded pool.
    pub fn run_io<T, Fut>(&self, task: Fut) -> TaskHandle<T>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        if self.is_shutdown() {
            return TaskHandle::failed(TaskError::Cancelled);
        }
        TaskHandle::spawn(task)
    }

    /// Run a blocking closure (synchronous I/O, sleeps) without taking a CPU slot.
    pub fn run_blocking<T, F>(&self, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, TaskError> + Send + 'static,
    {
        if self.is_shutdown() {
            return TaskHandle::failed(TaskError::Cancelled);
        }
        TaskHandle::from_join(tokio::task::spawn_blocking(task))
    }

    // ------------------------------------------------------------------
    // Combinators
    // ------------------------------------------------------------------

    /// Run `first` on the I/O pool, then hand its value to `next`.
    ///
    /// If `first` fails, the composite fails with the same error and `next`
    /// is never invoked.
    pub fn chain<T, R, Fut, N>(&self, first: Fut, next: N) -> TaskHandle<R>
    where
        T: Send + 'static,
        R: Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
        N: FnOnce(T) -> TaskHandle<R> + Send + 'static,
    {
        self.run_io(first).and_then(next)
    }

    /// Run every closure on the CPU pool and collect results in input order.
    ///
    /// Fails as soon as any closure fails. The remaining closures are not
    /// cancelled and may still be running when the failure is reported.
    pub fn join_all<T, F, I>(&self, tasks: I) -> TaskHandle<Vec<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, TaskError> + Send + 'static,
        I: IntoIterator<Item = F>,
    {
        let handles: Vec<TaskHandle<T>> = tasks.into_iter().map(|task| self.run(task)).collect();
        debug!(count = handles.len(), "join_all scheduled");
        TaskHandle::spawn(try_join_all(handles))
    }

    /// Run every future on the I/O pool and settle with whichever finishes first.
    ///
    /// The first outcome wins whether it is a success or a failure. Losers
    /// keep running; their outcomes are discarded.
    pub fn race_any<T, Fut, I>(&self, tasks: I) -> TaskHandle<T>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
        I: IntoIterator<Item = Fut>,
    {
        let handles: Vec<TaskHandle<T>> = tasks.into_iter().map(|task| self.run_io(task)).collect();
        if handles.is_empty() {
            return TaskHandle::failed(TaskError::invalid_input(
                "race_any requires at least one task",
            ));
        }

        TaskHandle::spawn(async move {
            let (outcome, winner, losers) = select_all(handles).await;
            debug!(winner, losers = losers.len(), "race_any settled");
            outcome
        })
    }

    /// Run `task` on the I/O pool, failing with a timeout if it takes too long.
    ///
    /// Only the wait is abandoned; the computation itself keeps running.
    pub fn with_timeout<T, Fut>(&self, task: Fut, timeout: Duration) -> TaskHandle<T>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        let handle = self.run_io(task);
        TaskHandle::spawn(async move {
            match tokio::time::timeout(timeout, handle).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    debug!(?timeout, "with_timeout elapsed");
                    Err(TaskError::Timeout(timeout))
                }
            }
        })
    }

    /// Run `task` on the I/O pool, replacing a failure with `fallback(error)`.
    pub fn with_fallback<T, Fut, F>(&self, task: Fut, fallback: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
        F: FnOnce(TaskError) -> T + Send + 'static,
    {
        let handle = self.run_io(task);
        TaskHandle::spawn(async move {
            match handle.await {
                Ok(value) => Ok(value),
                Err(err) => {
                    debug!(error = %err, "with_fallback recovering");
                    Ok(fallback(err))
                }
            }
        })
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}
