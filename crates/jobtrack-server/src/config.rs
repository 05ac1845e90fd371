//! Server configuration.

use std::time::Duration;

use jobtrack_engine::ExecutorConfig;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server bind address.
    pub http_addr: String,

    /// Size of the CPU-bound pool.
    pub cpu_workers: usize,

    /// ChromaDB base URL.
    pub chroma_url: String,

    /// Timeout for each ChromaDB request.
    pub chroma_timeout: Duration,

    /// How often finished jobs are swept. Zero disables the sweep.
    pub cleanup_interval: Duration,

    /// How long a finished job stays queryable.
    pub job_retention: Duration,

    /// Base delay of the demo greeting jobs.
    pub hello_delay: Duration,
}

impl Config {
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            cpu_workers: self.cpu_workers,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: "127.0.0.1:8080".to_string(),
            cpu_workers: ExecutorConfig::default().cpu_workers,
            chroma_url: "http://localhost:8000".to_string(),
            chroma_timeout: Duration::from_secs(30),
            cleanup_interval: Duration::from_secs(60),
            job_retention: Duration::from_secs(3600),
            hello_delay: Duration::from_millis(2000),
        }
    }
}
