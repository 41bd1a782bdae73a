//! Coordinated shutdown: force-close, accept stop, drain.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

mod common;

#[tokio::test]
async fn shutdown_closes_live_connections_and_stops_accepting() {
    // Idle timeout far longer than the test: closure must come from
    // the shutdown path, not from a read timing out.
    let server = common::start_server(60).await;

    let mut clients = Vec::new();
    for _ in 0..3 {
        let mut client = TcpStream::connect(server.addr).await.unwrap();
        let mut banner = [0u8; 7];
        client.read_exact(&mut banner).await.unwrap();
        clients.push(client);
    }
    common::wait_for_active_count(&server.registry, 3).await;

    server.controller.begin_shutdown();

    // Every blocked read is unblocked and each connection closes
    // without receiving a reply.
    for mut client in clients {
        let mut rest = Vec::new();
        let n = tokio::time::timeout(Duration::from_secs(5), client.read_to_end(&mut rest))
            .await
            .expect("connection was not force-closed")
            .unwrap();
        assert_eq!(n, 0, "force-closed connections must stay silent");
    }

    // The accept loop exits and the handlers all deregister.
    tokio::time::timeout(Duration::from_secs(5), server.run_task)
        .await
        .expect("accept loop did not exit")
        .unwrap();
    common::wait_for_active_count(&server.registry, 0).await;

    // The listening socket is gone with the accept loop.
    assert!(TcpStream::connect(server.addr).await.is_err());
}

#[tokio::test]
async fn shutdown_with_no_connections_is_clean() {
    let server = common::start_server(60).await;

    server.controller.begin_shutdown();
    // A second transition must be a no-op.
    server.controller.begin_shutdown();

    tokio::time::timeout(Duration::from_secs(5), server.run_task)
        .await
        .expect("accept loop did not exit")
        .unwrap();
    assert_eq!(server.registry.active_count(), 0);
}

#[tokio::test]
async fn force_close_stays_silent_even_with_partial_data() {
    let server = common::start_server(60).await;

    let mut client = TcpStream::connect(server.addr).await.unwrap();
    let mut banner = [0u8; 7];
    client.read_exact(&mut banner).await.unwrap();

    client.write_all(b"half a message").await.unwrap();
    common::wait_for_active_count(&server.registry, 1).await;

    server.controller.begin_shutdown();

    // A forced close is not a timeout: no ERROR reply, just closure.
    let mut rest = Vec::new();
    let n = tokio::time::timeout(Duration::from_secs(5), client.read_to_end(&mut rest))
        .await
        .expect("connection was not force-closed")
        .unwrap();
    assert_eq!(n, 0);
    common::wait_for_active_count(&server.registry, 0).await;
}
