//! Lifecycle coordinator.
//!
//! A [`Service`] owns a listen address and drives one worker through
//! startup, a blocking wait for a termination signal, and ordered shutdown.
//!
//! ```text
//! serve(name, addr, start, stop)
//!     logger {name: addr}      (fatal on failure)
//!     subscribe SIGINT/SIGTERM
//!     spawn start(result)
//!     wait: signal | close          ← suspension #1
//!     stop(logger).await
//!     wait: worker result           ← suspension #2 (optionally bounded)
//! ```
//!
//! Only one `serve` may run per coordinator at a time; a second concurrent
//! call is rejected with [`LifecycleError::AlreadyServing`].

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, oneshot, watch};

use crate::config::LoggingConfig;
use crate::lifecycle::signals::{self, SignalError, Termination};
use crate::observability::logging::{Logger, LoggingError};
use crate::observability::metrics;

/// Error type reported by workers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by [`Service::serve`].
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The logger for the named listener could not be built.
    #[error("logger: {name}")]
    Logger {
        name: String,
        #[source]
        source: LoggingError,
    },
    #[error(transparent)]
    Signals(#[from] SignalError),
    /// The error the worker sent on its result channel, unchanged.
    #[error(transparent)]
    Worker(BoxError),
    /// The worker dropped its result handle without reporting.
    #[error("worker exited without reporting a result")]
    WorkerLost,
    #[error("worker did not report within {0:?} after shutdown")]
    ShutdownTimedOut(Duration),
    #[error("service is already serving")]
    AlreadyServing,
}

impl LifecycleError {
    /// The worker's own error, if that is what ended the run.
    pub fn into_worker_error(self) -> Option<BoxError> {
        match self {
            LifecycleError::Worker(e) => Some(e),
            _ => None,
        }
    }
}

/// One-shot handle a worker uses to report how it exited.
#[derive(Debug)]
pub struct WorkerResult {
    tx: oneshot::Sender<Result<(), BoxError>>,
}

impl WorkerResult {
    /// Report the worker's terminal result. Consumes the handle, so it can
    /// only be sent once.
    pub fn send<E>(self, result: Result<(), E>)
    where
        E: Into<BoxError>,
    {
        // The coordinator may already have given up waiting.
        let _ = self.tx.send(result.map_err(Into::into));
    }

    pub fn ok(self) {
        self.send::<BoxError>(Ok(()));
    }

    pub fn fail<E>(self, error: E)
    where
        E: Into<BoxError>,
    {
        self.send(Err(error));
    }
}

/// Lifecycle coordinator for a long-running network service.
#[derive(Debug)]
pub struct Service {
    addr: RwLock<String>,
    closed: watch::Sender<bool>,
    serving: AtomicBool,
    logging: LoggingConfig,
    worker_timeout: Option<Duration>,
}

impl Service {
    /// Create a coordinator with an empty address.
    pub fn new() -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            addr: RwLock::new(String::new()),
            closed,
            serving: AtomicBool::new(false),
            logging: LoggingConfig::default(),
            worker_timeout: None,
        }
    }

    /// Use `config` when building the per-run logger.
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging = config;
        self
    }

    /// Bound the wait for the worker's result after stop returns.
    pub fn with_worker_timeout(mut self, timeout: Duration) -> Self {
        self.worker_timeout = Some(timeout);
        self
    }

    /// Set the listener address.
    pub fn set_addr(&self, value: impl Into<String>) {
        let mut addr = self.addr.write().unwrap_or_else(PoisonError::into_inner);
        *addr = value.into();
    }

    /// Get the listener address (empty if never set).
    pub fn get_addr(&self) -> String {
        self.addr
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Release the coordinator's wait as if a termination signal had arrived.
    ///
    /// Idempotent: only the first call has an effect. Calling it before
    /// `serve` makes `serve` shut down as soon as the worker is spawned.
    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Run `start` as a worker and block until a termination signal (or
    /// [`close`](Self::close)), then run `stop` and return the worker's result.
    ///
    /// `start` must send exactly one result through its [`WorkerResult`].
    /// `stop` must not return before graceful shutdown has finished.
    pub async fn serve<S, SFut, T, TFut>(
        &self,
        name: &str,
        addr: &str,
        start: S,
        stop: T,
    ) -> Result<(), LifecycleError>
    where
        S: FnOnce(WorkerResult) -> SFut,
        SFut: Future<Output = ()> + Send + 'static,
        T: FnOnce(Logger) -> TFut,
        TFut: Future<Output = ()>,
    {
        if self.serving.swap(true, Ordering::AcqRel) {
            return Err(LifecycleError::AlreadyServing);
        }
        let _serving = ServingGuard(&self.serving);

        let logger = Logger::new(&self.logging, name, addr).map_err(|source| LifecycleError::Logger {
            name: name.to_string(),
            source,
        })?;

        let mut signals = signals::subscribe()?;
        let mut closed = self.closed.subscribe();

        let (tx, retval) = oneshot::channel();
        tokio::spawn(start(WorkerResult { tx }));

        logger.info("The service is ready to listen and serve");

        let termination = tokio::select! {
            received = next_signal(&mut signals) => received,
            _ = closed.wait_for(|closed| *closed) => Termination::Closed,
        };
        match termination {
            Termination::Interrupt => logger.info("Got SIGINT..."),
            Termination::Terminate => logger.info("Got SIGTERM..."),
            Termination::Closed => logger.info("Service closed..."),
        }
        metrics::record_termination(termination.as_str());

        logger.info("The service is shutting down...");
        stop(logger.clone()).await;
        logger.info("The service is done");

        let result = match self.worker_timeout {
            Some(limit) => match tokio::time::timeout(limit, retval).await {
                Ok(received) => received,
                Err(_) => {
                    logger.error("Worker did not report after shutdown");
                    metrics::record_run("timed_out");
                    return Err(LifecycleError::ShutdownTimedOut(limit));
                }
            },
            None => retval.await,
        };

        let outcome = match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(LifecycleError::Worker(e)),
            Err(_) => Err(LifecycleError::WorkerLost),
        };
        metrics::record_run(if outcome.is_ok() { "ok" } else { "error" });
        outcome
    }
}

impl Default for Service {
    fn default() -> Self {
        Self::new()
    }
}

struct ServingGuard<'a>(&'a AtomicBool);

impl Drop for ServingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

async fn next_signal(signals: &mut broadcast::Receiver<Termination>) -> Termination {
    loop {
        match signals.recv().await {
            Ok(received) => return received,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            // Dispatcher gone: only close() can end the wait now.
            Err(broadcast::error::RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}
