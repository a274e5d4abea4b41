//! Probing real TCP, TLS and RPC endpoints.

use std::time::{Duration, Instant};

use svc_lifecycle::probe::{ping_conn, ping_rpc, Probe, ProbeError, RpcDialOptions};
use svc_lifecycle::resilience::Backoff;
use tokio::net::TcpListener;

mod common;

#[tokio::test]
async fn tls_probe_completes_handshake() {
    let cert = common::self_signed();
    let client = common::trusting(&cert);
    let addr = common::start_tls_server(cert).await;

    ping_conn(&format!("localhost:{}", addr.port()), 1, Duration::from_secs(2), Some(client))
        .await
        .expect("handshake should succeed");
}

#[tokio::test]
async fn tls_probe_with_sub_second_timeout() {
    let cert = common::self_signed();
    let client = common::trusting(&cert);
    let addr = common::start_tls_server(cert).await;

    ping_conn(&format!("localhost:{}", addr.port()), 1, Duration::from_millis(500), Some(client))
        .await
        .expect("sub-second timeout still completes the handshake");
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn tls_handshake_sets_keepalive_from_timeout() {
    use socket2::SockRef;
    use svc_lifecycle::probe::tls;

    let cert = common::self_signed();
    let client = common::trusting(&cert);
    let addr = common::start_tls_server(cert).await;
    let target = format!("localhost:{}", addr.port());

    let stream = tls::handshake(&target, Duration::from_secs(3), client.clone()).await.unwrap();
    let (tcp, _) = stream.get_ref();
    let socket = SockRef::from(tcp);
    assert_eq!(socket.keepalive_time().unwrap(), Duration::from_secs(3));
    assert_eq!(socket.keepalive_interval().unwrap(), Duration::from_secs(3));
    tls::close(stream).await;

    let stream = tls::handshake(&target, Duration::from_millis(500), client).await.unwrap();
    let (tcp, _) = stream.get_ref();
    assert_eq!(SockRef::from(tcp).keepalive_time().unwrap(), Duration::from_secs(1));
    tls::close(stream).await;
}

#[tokio::test]
async fn tls_probe_single_try_against_unreachable_host() {
    let client = common::trusting(&common::self_signed());
    let addr = common::free_addr();

    let started = Instant::now();
    let err = ping_conn(&addr.to_string(), 1, Duration::from_millis(500), Some(client))
        .await
        .unwrap_err();

    match err {
        ProbeError::Connect(e) => assert_eq!(e.kind(), std::io::ErrorKind::ConnectionRefused),
        other => panic!("expected refused connection, got {other:?}"),
    }
    // One attempt, no backoff sleep.
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn tls_probe_rejects_untrusted_certificate() {
    let client = common::trusting(&common::self_signed());
    let addr = common::start_tls_server(common::self_signed()).await;

    let err = ping_conn(&format!("localhost:{}", addr.port()), 1, Duration::from_secs(2), Some(client))
        .await
        .unwrap_err();

    assert!(matches!(err, ProbeError::Handshake(_)), "{err}");
}

#[tokio::test]
async fn tcp_probe_waits_for_late_listener() {
    let addr = common::free_addr();

    let binder = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let listener = TcpListener::bind(addr).await.unwrap();
        // Keep accepting long enough for the probe to connect.
        let _ = tokio::time::timeout(Duration::from_secs(5), listener.accept()).await;
    });

    Probe::new(20, Duration::from_millis(500))
        .with_backoff(Backoff::constant(Duration::from_millis(100)))
        .tcp(&addr.to_string())
        .await
        .expect("listener comes up within the retry window");

    binder.await.unwrap();
}

#[tokio::test]
async fn tcp_probe_without_tls_config() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    ping_conn(&addr, 3, Duration::from_secs(1), None).await.unwrap();
}

#[tokio::test]
async fn rpc_probe_lazy_and_blocking() {
    let addr = common::free_addr().to_string();

    ping_rpc(&addr, 1, &RpcDialOptions::default())
        .await
        .expect("lazy channel construction does not touch the network");

    let blocking = RpcDialOptions::default()
        .blocking()
        .with_connect_timeout(Duration::from_millis(500));
    let err = ping_rpc(&addr, 1, &blocking).await.unwrap_err();
    assert!(matches!(err, ProbeError::Rpc(_)), "{err}");
}
