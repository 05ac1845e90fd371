//! Demo greeting jobs, one per combinator.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use jobtrack_core::{root_cause_message, JobId, TaskError};
use jobtrack_engine::Executor;
use jobtrack_registry::JobRegistry;

/// Starts greeting jobs that exercise each engine combinator.
///
/// Every stage sleeps for a multiple of `delay` to simulate slow work.
#[derive(Debug, Clone)]
pub struct HelloService {
    executor: Executor,
    registry: Arc<JobRegistry>,
    delay: Duration,
}

impl HelloService {
    pub fn new(executor: Executor, registry: Arc<JobRegistry>, delay: Duration) -> Self {
        Self {
            executor,
            registry,
            delay,
        }
    }

    /// Sleep, then greet `name`.
    pub fn start_hello(&self, name: &str) -> JobId {
        let delay = self.delay;
        let greeting = format!("Hello, {}!", capitalize(name));
        self.registry.submit(format!("hello:{name}"), || {
            Ok(self.executor.run_io(async move {
                tokio::time::sleep(delay).await;
                Ok::<_, TaskError>(greeting)
            }))
        })
    }

    /// Two chained stages: build a base greeting, then decorate it.
    pub fn start_compose(&self, name: &str) -> JobId {
        let half = self.delay / 2;
        let base = format!("hello {name}");
        let second = self.executor.clone();
        self.registry.submit(format!("compose:{name}"), || {
            Ok(self.executor.chain(
                async move {
                    tokio::time::sleep(half).await;
                    Ok::<_, TaskError>(base)
                },
                move |base| {
                    second.run_io(async move {
                        tokio::time::sleep(half).await;
                        Ok::<_, TaskError>(format!("{base} (composed)"))
                    })
                },
            ))
        })
    }

    /// Three greetings of different speed; the fastest one wins.
    pub fn start_race(&self) -> JobId {
        let unit = self.delay / 2;
        self.registry.submit("race", || {
            Ok(self.executor.race_any(
                [(3, "Slow hello"), (1, "Fast hello"), (2, "Medium hello")].map(
                    |(units, greeting)| async move {
                        tokio::time::sleep(unit * units).await;
                        Ok::<_, TaskError>(greeting.to_string())
                    },
                ),
            ))
        })
    }

    /// Greetings in three languages computed on the CPU pool.
    pub fn start_all(&self, name: &str) -> JobId {
        let job_name = format!("all:{name}");
        let name = capitalize(name);
        self.registry.submit(job_name, || {
            let tasks = ["Hello", "Hola", "Bonjour"].map(|word| {
                let name = name.clone();
                move || Ok::<_, TaskError>(format!("{word}, {name}!"))
            });
            Ok(self.executor.join_all(tasks))
        })
    }

    /// A greeting that takes twice the delay, bounded by `timeout`.
    pub fn start_timeout(&self, name: &str, timeout: Duration) -> JobId {
        let slow = self.delay * 2;
        let greeting = format!("Hello, {}!", capitalize(name));
        info!(name = %name, ?timeout, "Starting timeout job");
        self.registry.submit(format!("timeout:{name}"), || {
            Ok(self.executor.with_timeout(
                async move {
                    tokio::time::sleep(slow).await;
                    Ok::<_, TaskError>(greeting)
                },
                timeout,
            ))
        })
    }

    /// A greeting whose upstream always fails, recovered by a fallback.
    pub fn start_fallback(&self, name: &str) -> JobId {
        let delay = self.delay / 2;
        let job_name = format!("fallback:{name}");
        let name = capitalize(name);
        self.registry.submit(job_name, || {
            Ok(self.executor.with_fallback(
                async move {
                    tokio::time::sleep(delay).await;
                    Err::<String, _>(TaskError::msg("greeting service unavailable"))
                },
                move |err| format!("Hello, {name}! (fallback: {})", root_cause_message(&err)),
            ))
        })
    }
}

/// Upper-case the first character. Blank input is returned unchanged.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if !s.trim().is_empty() => first.to_uppercase().chain(chars).collect(),
        _ => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::wait_terminal;
    use jobtrack_core::JobStatus;
    use jobtrack_engine::ExecutorConfig;
    use serde_json::json;

    fn service(delay_ms: u64) -> (HelloService, Arc<JobRegistry>) {
        let registry = Arc::new(JobRegistry::new());
        let executor = Executor::new(ExecutorConfig { cpu_workers: 4 });
        let service = HelloService::new(
            executor,
            Arc::clone(&registry),
            Duration::from_millis(delay_ms),
        );
        (service, registry)
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("zac"), "Zac");
        assert_eq!(capitalize("World"), "World");
        assert_eq!(capitalize("élan"), "Élan");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("  "), "  ");
    }

    #[tokio::test]
    async fn test_hello_job() {
        let (hello, registry) = service(100);
        let id = hello.start_hello("zac");

        let snap = registry.get(&id).unwrap();
        assert_eq!(snap.name, "hello:zac");
        assert_eq!(snap.status, JobStatus::Running);

        let done = wait_terminal(&registry, &id).await;
        assert_eq!(done.result, Some(json!("Hello, Zac!")));
    }

    #[tokio::test]
    async fn test_compose_job() {
        let (hello, registry) = service(20);
        let id = hello.start_compose("world");
        let done = wait_terminal(&registry, &id).await;
        assert_eq!(done.name, "compose:world");
        assert_eq!(done.result, Some(json!("hello world (composed)")));
    }

    #[tokio::test]
    async fn test_race_job() {
        let (hello, registry) = service(200);
        let id = hello.start_race();
        let done = wait_terminal(&registry, &id).await;
        assert_eq!(done.result, Some(json!("Fast hello")));
    }

    #[tokio::test]
    async fn test_all_job_keeps_order() {
        let (hello, registry) = service(20);
        let id = hello.start_all("ana");
        let done = wait_terminal(&registry, &id).await;
        assert_eq!(
            done.result,
            Some(json!(["Hello, Ana!", "Hola, Ana!", "Bonjour, Ana!"]))
        );
    }

    #[tokio::test]
    async fn test_timeout_job() {
        let (hello, registry) = service(100);

        let late = hello.start_timeout("zac", Duration::from_millis(20));
        let done = wait_terminal(&registry, &late).await;
        assert_eq!(done.status, JobStatus::Failed);
        assert_eq!(done.error.as_deref(), Some("Timed out after 20ms"));

        let in_time = hello.start_timeout("zac", Duration::from_secs(2));
        let done = wait_terminal(&registry, &in_time).await;
        assert_eq!(done.result, Some(json!("Hello, Zac!")));
    }

    #[tokio::test]
    async fn test_fallback_job() {
        let (hello, registry) = service(20);
        let id = hello.start_fallback("zac");
        let done = wait_terminal(&registry, &id).await;
        assert_eq!(done.status, JobStatus::Succeeded);
        assert_eq!(
            done.result,
            Some(json!("Hello, Zac! (fallback: greeting service unavailable)"))
        );
    }
}
