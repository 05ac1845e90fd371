//! Asynchronous handle for a computation in progress.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::{JoinError, JoinHandle};

use jobtrack_core::TaskError;

/// Handle to a scheduled computation.
///
/// Resolves to the computation's value or the [`TaskError`] it raised.
/// Panics and runtime cancellation surface as `TaskError::Panicked` and
/// `TaskError::Cancelled`. Dropping a handle detaches the computation.
pub struct TaskHandle<T> {
    inner: Inner<T>,
}

enum Inner<T> {
    Spawned(JoinHandle<Result<T, TaskError>>),
    Ready(Option<Result<T, TaskError>>),
}

// The value is only ever moved out, never pinned.
impl<T> Unpin for TaskHandle<T> {}

impl<T> TaskHandle<T> {
    /// Wrap a runtime join handle.
    pub fn from_join(handle: JoinHandle<Result<T, TaskError>>) -> Self {
        Self {
            inner: Inner::Spawned(handle),
        }
    }

    /// Handle that is already resolved with a value.
    pub fn ready(value: T) -> Self {
        Self {
            inner: Inner::Ready(Some(Ok(value))),
        }
    }

    /// Handle that is already resolved with a failure.
    pub fn failed(err: TaskError) -> Self {
        Self {
            inner: Inner::Ready(Some(Err(err))),
        }
    }

    /// Whether the computation has finished.
    pub fn is_finished(&self) -> bool {
        match &self.inner {
            Inner::Spawned(handle) => handle.is_finished(),
            Inner::Ready(_) => true,
        }
    }
}

impl<T: Send + 'static> TaskHandle<T> {
    /// Spawn a future as its own runtime task.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        Self::from_join(tokio::spawn(future))
    }

    /// Register a continuation that runs exactly once when the handle resolves.
    ///
    /// The observer runs on a runtime task, never on the caller's thread.
    pub fn on_complete<F>(self, observer: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<T, TaskError>) + Send + 'static,
    {
        tokio::spawn(async move {
            let outcome = self.await;
            observer(outcome);
        })
    }

    /// Transform the value once it is available.
    pub fn map<U, F>(self, f: F) -> TaskHandle<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        TaskHandle::spawn(async move { self.await.map(f) })
    }

    /// Start a second stage with the value once it is available.
    ///
    /// On failure the second stage is never invoked.
    pub fn and_then<U, F>(self, f: F) -> TaskHandle<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> TaskHandle<U> + Send + 'static,
    {
        TaskHandle::spawn(async move {
            let value = self.await?;
            f(value).await
        })
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, TaskError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.inner {
            Inner::Spawned(handle) => Pin::new(handle)
                .poll(cx)
                .map(|joined| joined.unwrap_or_else(|err| Err(join_error(err)))),
            Inner::Ready(slot) => Poll::Ready(
                slot.take()
                    .unwrap_or_else(|| Err(TaskError::msg("TaskHandle polled after completion"))),
            ),
        }
    }
}

impl<T> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Convert a runtime join failure into a task failure.
pub(crate) fn join_error(err: JoinError) -> TaskError {
    if err.is_panic() {
        TaskError::Panicked(panic_message(&*err.into_panic()))
    } else {
        TaskError::Cancelled
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_ready_and_failed() {
        assert_eq!(TaskHandle::ready(7).await.unwrap(), 7);

        let err = TaskHandle::<u32>::failed(TaskError::msg("nope")).await.unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }

    #[tokio::test]
    async fn test_map_and_then() {
        let handle = TaskHandle::spawn(async { Ok::<_, TaskError>(20) })
            .map(|v| v + 1)
            .and_then(|v| TaskHandle::ready(v * 2));
        assert_eq!(handle.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_and_then_skipped_on_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let err = TaskHandle::<u32>::failed(TaskError::msg("first stage failed"))
            .and_then(move |v| {
                seen.fetch_add(1, Ordering::SeqCst);
                TaskHandle::ready(v)
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "first stage failed");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panic_becomes_failure() {
        let handle = TaskHandle::<u32>::spawn(async {
            if true {
                panic!("kaboom");
            }
            Ok(1)
        });

        match handle.await {
            Err(TaskError::Panicked(message)) => assert_eq!(message, "kaboom"),
            other => panic!("Expected Panicked, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_on_complete_fires_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let observer = TaskHandle::spawn(async { Ok::<_, TaskError>("done") }).on_complete(
            move |outcome| {
                assert_eq!(outcome.unwrap(), "done");
                seen.fetch_add(1, Ordering::SeqCst);
            },
        );

        observer.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
