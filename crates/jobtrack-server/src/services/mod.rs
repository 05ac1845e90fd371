//! Job starters built on the engine and registry.

mod chroma;
mod hello;

pub use chroma::ChromaService;
pub use hello::{capitalize, HelloService};
