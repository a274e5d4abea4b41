//! TLS attempts: TCP connect with keep-alive, then a client handshake.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use socket2::{SockRef, TcpKeepalive};
use tokio::io::AsyncWriteExt;
use tokio::net::{lookup_host, TcpSocket, TcpStream};
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

use crate::probe::ProbeError;

/// Connect to `addr` and complete a TLS handshake, all within `timeout`.
///
/// The server name is the host part of `addr`. `timeout`, rounded up to
/// whole seconds, is also the TCP keep-alive time of the underlying socket.
pub async fn handshake(
    addr: &str,
    timeout: Duration,
    config: Arc<rustls::ClientConfig>,
) -> Result<TlsStream<TcpStream>, ProbeError> {
    let server_name = server_name(addr)?;
    let connector = TlsConnector::from(config);

    let attempt = async {
        let tcp = connect_with_keepalive(addr, timeout)
            .await
            .map_err(ProbeError::Connect)?;
        connector
            .connect(server_name, tcp)
            .await
            .map_err(ProbeError::Handshake)
    };

    tokio::time::timeout(timeout, attempt)
        .await
        .map_err(|_| ProbeError::Timeout {
            addr: addr.to_string(),
            timeout,
        })?
}

/// Send close_notify and drop the connection.
pub async fn close(mut stream: TlsStream<TcpStream>) {
    let _ = stream.shutdown().await;
}

/// Derive the TLS server name from the host part of `host:port`.
pub fn server_name(addr: &str) -> Result<ServerName<'static>, ProbeError> {
    let host = addr.rsplit_once(':').map_or(addr, |(host, _)| host);
    let host = host.trim_start_matches('[').trim_end_matches(']');
    ServerName::try_from(host)
        .map(|name| name.to_owned())
        .map_err(|_| ProbeError::InvalidServerName {
            host: host.to_string(),
        })
}

/// Keep-alive period for a probe timeout.
///
/// The kernel takes whole seconds and rejects zero, so the value is rounded
/// up with a one second floor.
pub fn keepalive_period(timeout: Duration) -> Duration {
    let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
    Duration::from_secs(secs.max(1))
}

async fn connect_with_keepalive(addr: &str, timeout: Duration) -> io::Result<TcpStream> {
    let mut last = None;
    for target in lookup_host(addr).await? {
        match connect_one(target, keepalive_period(timeout)).await {
            Ok(stream) => return Ok(stream),
            Err(e) => last = Some(e),
        }
    }
    Err(last.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "could not resolve to any address")
    }))
}

async fn connect_one(target: SocketAddr, keepalive: Duration) -> io::Result<TcpStream> {
    let socket = if target.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };

    let params = TcpKeepalive::new().with_time(keepalive);
    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
    let params = params.with_interval(keepalive);
    SockRef::from(&socket).set_tcp_keepalive(&params)?;

    socket.connect(target).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_name_from_dns_host() {
        match server_name("example.com:443").unwrap() {
            ServerName::DnsName(name) => assert_eq!(name.as_ref(), "example.com"),
            other => panic!("expected DNS name, got {other:?}"),
        }
    }

    #[test]
    fn server_name_from_ip_hosts() {
        assert!(matches!(server_name("127.0.0.1:8443").unwrap(), ServerName::IpAddress(_)));
        assert!(matches!(server_name("[::1]:8443").unwrap(), ServerName::IpAddress(_)));
    }

    #[test]
    fn keepalive_rounds_up_to_whole_seconds() {
        assert_eq!(keepalive_period(Duration::ZERO), Duration::from_secs(1));
        assert_eq!(keepalive_period(Duration::from_millis(500)), Duration::from_secs(1));
        assert_eq!(keepalive_period(Duration::from_secs(1)), Duration::from_secs(1));
        assert_eq!(keepalive_period(Duration::from_millis(1001)), Duration::from_secs(2));
        assert_eq!(keepalive_period(Duration::from_secs(7)), Duration::from_secs(7));
    }

    #[test]
    fn rejects_invalid_host() {
        let err = server_name("bad host!:443").unwrap_err();
        assert!(matches!(err, ProbeError::InvalidServerName { ref host } if host == "bad host!"));
    }
}
