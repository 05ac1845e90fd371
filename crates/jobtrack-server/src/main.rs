//! JobTrack Server

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use jobtrack_server::cleanup::spawn_cleanup_task;
use jobtrack_server::{http, AppState, Config};

/// JobTrack HTTP server.
#[derive(Parser, Debug)]
#[command(name = "jobtrack-server", about = "Fire-and-track background job server")]
struct Args {
    /// HTTP server address
    #[arg(long, env = "JOBTRACK_HTTP_ADDR")]
    http_addr: Option<String>,

    /// Size of the CPU-bound pool (default: max(4, available cores))
    #[arg(long, env = "JOBTRACK_CPU_WORKERS")]
    cpu_workers: Option<usize>,

    /// ChromaDB base URL
    #[arg(long, env = "CHROMADB_URL")]
    chroma_url: Option<String>,

    /// ChromaDB request timeout in seconds
    #[arg(long, env = "CHROMADB_TIMEOUT_SECS")]
    chroma_timeout_secs: Option<u64>,

    /// Seconds between job cleanup sweeps (0 disables)
    #[arg(long, env = "JOBTRACK_CLEANUP_INTERVAL_SECS")]
    cleanup_interval_secs: Option<u64>,

    /// Seconds a finished job stays queryable
    #[arg(long, env = "JOBTRACK_JOB_RETENTION_SECS")]
    job_retention_secs: Option<u64>,

    /// Base delay of the greeting demo jobs in milliseconds
    #[arg(long, env = "JOBTRACK_HELLO_DELAY_MS")]
    hello_delay_ms: Option<u64>,
}

impl Args {
    /// Overlay the given flags on the default configuration.
    fn into_config(self) -> Config {
        let defaults = Config::default();
        Config {
            http_addr: self.http_addr.unwrap_or(defaults.http_addr),
            cpu_workers: self.cpu_workers.unwrap_or(defaults.cpu_workers),
            chroma_url: self.chroma_url.unwrap_or(defaults.chroma_url),
            chroma_timeout: self
                .chroma_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.chroma_timeout),
            cleanup_interval: self
                .cleanup_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.cleanup_interval),
            job_retention: self
                .job_retention_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.job_retention),
            hello_delay: self
                .hello_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.hello_delay),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Args::parse().into_config();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new("jobtrack=info,tower_http=info"))?,
        )
        .with_target(true)
        .init();

    let http_addr: SocketAddr = config.http_addr.parse()?;

    info!(
        http_addr = %http_addr,
        cpu_workers = config.cpu_workers,
        chroma_url = %config.chroma_url,
        "Starting JobTrack server"
    );

    let state = AppState::new(config)?;
    let cleanup = spawn_cleanup_task(
        state.registry.clone(),
        state.config.cleanup_interval,
        state.config.job_retention,
    );

    let router = http::create_router(state.clone());
    let listener = TcpListener::bind(http_addr).await?;
    info!("HTTP server listening on {}", http_addr);

    let result = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(cleanup) = cleanup {
        cleanup.abort();
    }
    state.executor.shutdown();

    if let Err(e) = result {
        error!(error = %e, "HTTP server error");
        return Err(e.into());
    }

    info!("JobTrack server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
