//! End-to-end: echo worker under the coordinator, reached through a probe.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use svc_lifecycle::config::ListenerConfig;
use svc_lifecycle::lifecycle::{Service, Shutdown};
use svc_lifecycle::net::connection::ConnectionTracker;
use svc_lifecycle::net::echo::EchoServer;
use svc_lifecycle::net::listener::Listener;
use svc_lifecycle::probe::Probe;
use svc_lifecycle::resilience::Backoff;

#[tokio::test]
async fn echo_service_serves_until_closed() {
    let config = ListenerConfig {
        name: "echo".into(),
        bind_address: "127.0.0.1:0".into(),
        max_connections: 8,
    };
    let listener = Listener::bind(&config).await.unwrap();

    let service = Service::new().with_worker_timeout(Duration::from_secs(5));
    service.set_addr(listener.local_addr().unwrap().to_string());
    let addr = service.get_addr();

    let shutdown = Shutdown::new();
    let tracker = ConnectionTracker::new();
    let server = EchoServer::new(listener, tracker.clone());
    let worker_shutdown = shutdown.subscribe();
    let stop_tracker = tracker.clone();

    let serve = service.serve(
        &config.name,
        &addr,
        move |result| async move { result.send(server.run(worker_shutdown).await) },
        move |_logger| async move {
            shutdown.trigger();
            assert!(stop_tracker.drain(Duration::from_secs(5)).await);
        },
    );

    let client = async {
        Probe::new(10, Duration::from_millis(500))
            .with_backoff(Backoff::constant(Duration::from_millis(50)))
            .tcp(&addr)
            .await
            .unwrap();

        let mut stream = TcpStream::connect(&addr).await.unwrap();
        stream.write_all(b"hello").await.unwrap();
        let mut buf = [0u8; 5];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello");

        service.close();
        stream
    };

    let (result, mut stream) = tokio::join!(serve, client);
    assert!(result.is_ok(), "{result:?}");
    assert_eq!(tracker.active_count(), 0);

    let mut rest = Vec::new();
    assert_eq!(stream.read_to_end(&mut rest).await.unwrap(), 0);
}
