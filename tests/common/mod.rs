//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use accio_server::config::ServerConfig;
use accio_server::lifecycle::{ServerState, Shutdown, ShutdownController};
use accio_server::net::{ConnectionRegistry, Listener};

/// A server on an ephemeral port, plus the handles tests poke at.
pub struct TestServer {
    pub addr: SocketAddr,
    pub registry: Arc<ConnectionRegistry>,
    pub controller: ShutdownController,
    pub run_task: JoinHandle<()>,
}

/// Start a server on 127.0.0.1 with the given idle timeout.
pub async fn start_server(idle_secs: u64) -> TestServer {
    let mut config = ServerConfig::default();
    config.listener.bind_host = "127.0.0.1".to_string();
    config.timeouts.idle_secs = idle_secs;

    let registry = Arc::new(ConnectionRegistry::new());
    let state = Arc::new(ServerState::new());
    let shutdown = Arc::new(Shutdown::new());

    let listener = Listener::bind(0, &config, Arc::clone(&registry))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let controller = ShutdownController::new(
        Arc::clone(&state),
        Arc::clone(&registry),
        Arc::clone(&shutdown),
    );

    let run_state = Arc::clone(&state);
    let run_shutdown = Arc::clone(&shutdown);
    let run_task = tokio::spawn(async move {
        listener.run(run_state, &run_shutdown).await;
    });

    TestServer {
        addr,
        registry,
        controller,
        run_task,
    }
}

/// Poll the registry until it reports `expected` live connections.
#[allow(dead_code)]
pub async fn wait_for_active_count(registry: &ConnectionRegistry, expected: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while registry.active_count() != expected {
        if tokio::time::Instant::now() >= deadline {
            panic!(
                "registry never reached {} connections (currently {})",
                expected,
                registry.active_count()
            );
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
