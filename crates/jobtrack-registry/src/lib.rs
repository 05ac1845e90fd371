//! JobTrack Job Registry
//!
//! Tracks the lifecycle of every submitted job in memory and hands out
//! immutable snapshots to concurrent readers. The registry is an ordinary
//! value: construct one, wrap it in an `Arc`, and pass it to whoever needs it.

mod record;
pub mod registry;

pub use registry::JobRegistry;
