//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Serve (service.rs):
//!     Build logger → Subscribe to signals → Spawn worker
//!     → wait for SIGINT/SIGTERM (or close)
//!     → run stop → wait for the worker's result → return it
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → process-wide dispatcher → every subscribed coordinator
//!
//! Shutdown (shutdown.rs):
//!     stop function triggers → worker tasks observe → stop accepting, drain
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop always runs before the worker's result is awaited
//! - The returned error is the worker's, never the stop function's
//! - No internal retries; restarting a failed worker is the caller's job

pub mod service;
pub mod shutdown;
pub mod signals;

pub use service::{BoxError, LifecycleError, Service, WorkerResult};
pub use shutdown::{Shutdown, ShutdownListener};
pub use signals::{SignalError, Termination};
