//! Shared application state.

use std::sync::Arc;

use jobtrack_engine::Executor;
use jobtrack_registry::JobRegistry;

use crate::chroma::ChromaClient;
use crate::config::Config;
use crate::error::ServerError;
use crate::services::{ChromaService, HelloService};

/// Shared application state.
pub struct AppState {
    pub config: Config,

    /// Every job started through the API.
    pub registry: Arc<JobRegistry>,

    pub executor: Executor,
    pub hello: HelloService,
    pub chroma: ChromaService,
}

impl AppState {
    /// Build the executor, registry and services from configuration.
    pub fn new(config: Config) -> Result<Arc<Self>, ServerError> {
        let registry = Arc::new(JobRegistry::new());
        let executor = Executor::new(config.executor_config());
        let client = ChromaClient::new(&config.chroma_url, config.chroma_timeout)
            .map_err(|e| ServerError::Config(e.to_string()))?;

        let hello = HelloService::new(executor.clone(), Arc::clone(&registry), config.hello_delay);
        let chroma = ChromaService::new(executor.clone(), Arc::clone(&registry), client);

        Ok(Arc::new(Self {
            config,
            registry,
            executor,
            hello,
            chroma,
        }))
    }
}
