//! Endpoint probing subsystem.
//!
//! # Data Flow
//! ```text
//! ping_conn / ping_rpc / Probe::{tcp, tls, rpc}
//!     → Probe::retry (bounded attempts, backoff between them)
//!         → tcp.rs  (bare stream connect with timeout)
//!         → tls.rs  (connect + handshake, keep-alive = timeout)
//!         → rpc.rs  (tonic channel construction)
//!     → connection closed immediately on success
//! ```
//!
//! # Design Decisions
//! - One retry shape for every transport; only the attempt differs
//! - The last attempt's error is returned as-is
//! - No sleep after the final attempt
//! - Probes never log; failures are visible only through the returned error

pub mod rpc;
pub mod tcp;
pub mod tls;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::ProbeConfig;
use crate::observability::metrics;
use crate::resilience::Backoff;

pub use rpc::RpcDialOptions;

/// Error from a single probe attempt; the last one is what a probe returns.
///
/// Connect, handshake and dial failures display exactly as the underlying error.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe made no attempts (tries = 0)")]
    NoAttempts,
    #[error(transparent)]
    Connect(std::io::Error),
    #[error("connect to {addr} timed out after {timeout:?}")]
    Timeout { addr: String, timeout: Duration },
    #[error("invalid TLS server name {host:?}")]
    InvalidServerName { host: String },
    #[error(transparent)]
    Handshake(std::io::Error),
    #[error("invalid RPC endpoint {addr:?}: {source}")]
    InvalidEndpoint {
        addr: String,
        #[source]
        source: tonic::transport::Error,
    },
    #[error(transparent)]
    Rpc(tonic::transport::Error),
}

/// Reachability check with bounded attempts.
#[derive(Debug, Clone)]
pub struct Probe {
    tries: u32,
    timeout: Duration,
    backoff: Backoff,
}

impl Probe {
    /// `tries` attempts, each bounded by `timeout`, one second apart.
    pub fn new(tries: u32, timeout: Duration) -> Self {
        Self {
            tries,
            timeout,
            backoff: Backoff::default(),
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(config.tries, config.timeout()).with_backoff(config.backoff)
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn tries(&self) -> u32 {
        self.tries
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Wait until `addr` accepts a plain TCP connection.
    pub async fn tcp(&self, addr: &str) -> Result<(), ProbeError> {
        self.retry("tcp", || tcp::connect(addr, self.timeout))
            .await
            .map(drop)
    }

    /// Wait until `addr` completes a TLS handshake under `config`.
    pub async fn tls(&self, addr: &str, config: Arc<rustls::ClientConfig>) -> Result<(), ProbeError> {
        let stream = self
            .retry("tls", || tls::handshake(addr, self.timeout, Arc::clone(&config)))
            .await?;
        tls::close(stream).await;
        Ok(())
    }

    /// Wait until an RPC channel to `addr` can be built with `options`.
    ///
    /// Attempts are bounded by `options`, not by this probe's timeout.
    pub async fn rpc(&self, addr: &str, options: &RpcDialOptions) -> Result<(), ProbeError> {
        self.retry("rpc", || rpc::dial(addr, options))
            .await
            .map(drop)
    }

    /// Run `attempt` until it succeeds or the tries are spent, sleeping the
    /// backoff delay between failures (never after the last one).
    pub async fn retry<F, Fut, T>(&self, transport: &'static str, mut attempt: F) -> Result<T, ProbeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProbeError>>,
    {
        let mut last = ProbeError::NoAttempts;
        for n in 1..=self.tries {
            match attempt().await {
                Ok(connection) => {
                    metrics::record_probe_attempt(transport, true);
                    return Ok(connection);
                }
                Err(e) => {
                    metrics::record_probe_attempt(transport, false);
                    last = e;
                }
            }

            if n < self.tries {
                tokio::time::sleep(self.backoff.delay(n)).await;
            }
        }
        Err(last)
    }
}

/// Probe a TCP endpoint, over TLS when `tls` is given.
pub async fn ping_conn(
    addr: &str,
    tries: u32,
    timeout: Duration,
    tls: Option<Arc<rustls::ClientConfig>>,
) -> Result<(), ProbeError> {
    let probe = Probe::new(tries, timeout);
    match tls {
        Some(config) => probe.tls(addr, config).await,
        None => probe.tcp(addr).await,
    }
}

/// Probe an RPC endpoint.
pub async fn ping_rpc(addr: &str, tries: u32, options: &RpcDialOptions) -> Result<(), ProbeError> {
    Probe::new(tries, Duration::from_secs(1)).rpc(addr, options).await
}
