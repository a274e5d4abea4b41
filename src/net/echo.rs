//! Reference worker: a TCP echo server.
//!
//! Runs under the lifecycle coordinator in the `svc-lifecycle` binary and in
//! the integration tests. Accepting stops when shutdown is triggered; open
//! connections are closed at the same moment and released from the tracker.

use std::io;

use tokio::net::TcpStream;

use crate::lifecycle::ShutdownListener;
use crate::net::connection::{ConnectionGuard, ConnectionTracker};
use crate::net::listener::{ConnectionPermit, Listener, ListenerError};

/// Echo server over a bounded listener.
#[derive(Debug)]
pub struct EchoServer {
    listener: Listener,
    tracker: ConnectionTracker,
}

impl EchoServer {
    pub fn new(listener: Listener, tracker: ConnectionTracker) -> Self {
        Self { listener, tracker }
    }

    /// Accept and echo until `shutdown` fires.
    pub async fn run(self, mut shutdown: ShutdownListener) -> Result<(), ListenerError> {
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!(active = self.tracker.active_count(), "Echo server stopped accepting");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, peer, permit) = match accepted {
                        Ok(connection) => connection,
                        Err(ListenerError::Accept(e)) => {
                            tracing::warn!(error = %e, "Accept failed");
                            continue;
                        }
                        Err(e) => return Err(e),
                    };
                    let guard = self.tracker.track();
                    tracing::debug!(connection_id = %guard.id(), peer_addr = %peer, "Echo connection opened");
                    tokio::spawn(serve_connection(stream, permit, guard, shutdown.clone()));
                }
            }
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    _permit: ConnectionPermit,
    guard: ConnectionGuard,
    mut shutdown: ShutdownListener,
) {
    tokio::select! {
        copied = echo(stream) => match copied {
            Ok(bytes) => tracing::debug!(connection_id = %guard.id(), bytes, "Echo connection finished"),
            Err(e) => tracing::debug!(connection_id = %guard.id(), error = %e, "Echo connection failed"),
        },
        _ = shutdown.recv() => {
            tracing::debug!(connection_id = %guard.id(), "Echo connection closed by shutdown");
        }
    }
}

async fn echo(mut stream: TcpStream) -> io::Result<u64> {
    let (mut reader, mut writer) = stream.split();
    tokio::io::copy(&mut reader, &mut writer).await
}
