//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Probe attempt fails:
//!     → backoff.rs (delay before the next attempt)
//!     → attempt again until tries are exhausted
//! ```
//!
//! # Design Decisions
//! - Constant delay is the default (one second between attempts)
//! - Exponential delay is capped and jittered to avoid synchronized retries
//! - No delay after the final attempt; that is the caller's loop, not the policy

pub mod backoff;

pub use backoff::Backoff;
