//! JobTrack Server Library
//!
//! Wires the engine and job registry into an HTTP service: greeting demo
//! jobs, ChromaDB jobs, job polling, metrics, and periodic cleanup.

pub mod chroma;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod services;
pub mod state;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::ServerError;
pub use state::AppState;
