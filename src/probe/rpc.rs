//! RPC channel attempts.

use std::time::Duration;

use tonic::transport::{Channel, Endpoint};

use crate::probe::ProbeError;

/// How to build the RPC channel.
#[derive(Debug, Clone, Default)]
pub struct RpcDialOptions {
    /// Bound on establishing the connection.
    pub connect_timeout: Option<Duration>,
    /// Per-request timeout applied to the channel.
    pub timeout: Option<Duration>,
    /// Wait for the connection to be established. When false the channel is
    /// built lazily and only the construction path is checked.
    pub block: bool,
}

impl RpcDialOptions {
    pub fn blocking(mut self) -> Self {
        self.block = true;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Build the endpoint for `addr`; bare `host:port` gets an `http://` scheme.
pub fn endpoint(addr: &str, options: &RpcDialOptions) -> Result<Endpoint, ProbeError> {
    let uri = if addr.contains("://") {
        addr.to_string()
    } else {
        format!("http://{addr}")
    };

    let mut endpoint = Endpoint::from_shared(uri).map_err(|source| ProbeError::InvalidEndpoint {
        addr: addr.to_string(),
        source,
    })?;
    if let Some(timeout) = options.connect_timeout {
        endpoint = endpoint.connect_timeout(timeout);
    }
    if let Some(timeout) = options.timeout {
        endpoint = endpoint.timeout(timeout);
    }
    Ok(endpoint)
}

/// Build a channel to `addr`.
pub async fn dial(addr: &str, options: &RpcDialOptions) -> Result<Channel, ProbeError> {
    let endpoint = endpoint(addr, options)?;
    if options.block {
        endpoint.connect().await.map_err(ProbeError::Rpc)
    } else {
        Ok(endpoint.connect_lazy())
    }
}
