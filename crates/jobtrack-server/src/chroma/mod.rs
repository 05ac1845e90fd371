//! ChromaDB REST client.

mod client;
mod error;
pub mod types;

pub use client::ChromaClient;
pub use error::ChromaError;
