//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGINT and SIGTERM handlers once per process
//! - Fan every received signal out to all subscribed coordinators
//!
//! # Design Decisions
//! - Handlers live on a dedicated thread with its own runtime, so they survive
//!   the runtime of whichever coordinator subscribed first
//! - Registration is process-wide; subscribing never steals signals from
//!   other subscribers
//! - Once registered, SIGINT/SIGTERM no longer terminate the process by default

use std::fmt;
use std::sync::{mpsc, OnceLock};

use thiserror::Error;
use tokio::sync::broadcast;

/// What ended a coordinator's wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// SIGINT (Ctrl+C).
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// The coordinator was closed programmatically.
    Closed,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::Interrupt => "SIGINT",
            Termination::Terminate => "SIGTERM",
            Termination::Closed => "close",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signal handlers could not be installed.
#[derive(Debug, Clone, Error)]
#[error("failed to install signal handlers: {0}")]
pub struct SignalError(String);

static DISPATCHER: OnceLock<Result<broadcast::Sender<Termination>, SignalError>> = OnceLock::new();

/// Subscribe to process termination signals.
///
/// The first call installs the handlers and blocks until they are registered.
pub fn subscribe() -> Result<broadcast::Receiver<Termination>, SignalError> {
    DISPATCHER
        .get_or_init(install)
        .as_ref()
        .map(broadcast::Sender::subscribe)
        .map_err(Clone::clone)
}

fn install() -> Result<broadcast::Sender<Termination>, SignalError> {
    let (tx, _) = broadcast::channel(16);
    let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), String>>(1);
    let forward = tx.clone();

    std::thread::Builder::new()
        .name("signal-dispatcher".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            };
            runtime.block_on(dispatch(forward, ready_tx));
        })
        .map_err(|e| SignalError(e.to_string()))?;

    match ready_rx.recv() {
        Ok(Ok(())) => {
            tracing::debug!("Signal handlers installed");
            Ok(tx)
        }
        Ok(Err(e)) => Err(SignalError(e)),
        Err(_) => Err(SignalError("dispatcher thread exited".into())),
    }
}

#[cfg(unix)]
async fn dispatch(tx: broadcast::Sender<Termination>, ready: mpsc::SyncSender<Result<(), String>>) {
    use tokio::signal::unix::{signal, SignalKind};

    let registered = signal(SignalKind::interrupt())
        .and_then(|interrupt| Ok((interrupt, signal(SignalKind::terminate())?)));
    let (mut interrupt, mut terminate) = match registered {
        Ok(streams) => {
            let _ = ready.send(Ok(()));
            streams
        }
        Err(e) => {
            let _ = ready.send(Err(e.to_string()));
            return;
        }
    };

    loop {
        let received = tokio::select! {
            Some(()) = interrupt.recv() => Termination::Interrupt,
            Some(()) = terminate.recv() => Termination::Terminate,
            else => break,
        };
        tracing::debug!(signal = %received, subscribers = tx.receiver_count(), "Dispatching signal");
        // No subscribers is fine; nobody is serving right now.
        let _ = tx.send(received);
    }
}

#[cfg(not(unix))]
async fn dispatch(tx: broadcast::Sender<Termination>, ready: mpsc::SyncSender<Result<(), String>>) {
    let _ = ready.send(Ok(()));
    while tokio::signal::ctrl_c().await.is_ok() {
        let _ = tx.send(Termination::Interrupt);
    }
}
