//! Process lifecycle and endpoint probing for long-running network services.
//!
//! - [`Service`] blocks until SIGINT/SIGTERM, runs an ordered shutdown and
//!   returns the worker's own exit status.
//! - [`probe`] waits for a TCP, TLS or RPC endpoint to become reachable with
//!   bounded retries.

pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod ordering;
pub mod probe;
pub mod resilience;

pub use config::ServiceConfig;
pub use lifecycle::{LifecycleError, Service, WorkerResult};
pub use ordering::OffsetHeap;
pub use probe::{ping_conn, ping_rpc, Probe, ProbeError, RpcDialOptions};
