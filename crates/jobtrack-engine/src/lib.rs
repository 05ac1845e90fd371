//! JobTrack Task Combinator Engine
//!
//! Runs zero-argument computations without blocking the caller and composes
//! the resulting [`TaskHandle`]s:
//!
//! - [`Executor::run`] / [`Executor::run_io`] / [`Executor::run_blocking`]
//! - [`Executor::chain`], [`Executor::join_all`], [`Executor::race_any`]
//! - [`Executor::with_timeout`], [`Executor::with_fallback`]
//!
//! Nothing here is ever cancelled: dropping a handle detaches the underlying
//! computation, it does not abort it.

pub mod executor;
pub mod handle;

pub use executor::{Executor, ExecutorConfig};
pub use handle::TaskHandle;
pub use jobtrack_core::TaskError;
