//! Plain TCP attempts.

use std::time::Duration;

use tokio::net::TcpStream;

use crate::probe::ProbeError;

/// Open a bare TCP connection to `addr` within `timeout`.
pub async fn connect(addr: &str, timeout: Duration) -> Result<TcpStream, ProbeError> {
    match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(source)) => Err(ProbeError::Connect(source)),
        Err(_) => Err(ProbeError::Timeout {
            addr: addr.to_string(),
            timeout,
        }),
    }
}
