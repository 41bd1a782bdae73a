//! Shutdown coordination for the server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::net::ConnectionRegistry;

/// Process-wide run flag.
///
/// True at start, flipped exactly once by the first terminating signal.
/// Owned by startup and shared by handle with the accept loop and the
/// shutdown path.
#[derive(Debug, Default)]
pub struct ServerState {
    stopping: AtomicBool,
}

impl ServerState {
    /// Create a running state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the server should keep accepting connections.
    pub fn is_running(&self) -> bool {
        !self.stopping.load(Ordering::SeqCst)
    }

    /// Flip to stopping. Returns true only for the call that made the
    /// transition.
    pub fn stop(&self) -> bool {
        !self.stopping.swap(true, Ordering::SeqCst)
    }
}

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that long-running tasks subscribe to.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives the RUNNING → STOPPING transition.
///
/// Only ever manipulates connections through the registry's serialized
/// API; the signal path never touches a socket owned by another task.
pub struct ShutdownController {
    state: Arc<ServerState>,
    registry: Arc<ConnectionRegistry>,
    shutdown: Arc<Shutdown>,
}

impl ShutdownController {
    /// Create a controller over the shared state, registry and channel.
    pub fn new(
        state: Arc<ServerState>,
        registry: Arc<ConnectionRegistry>,
        shutdown: Arc<Shutdown>,
    ) -> Self {
        Self {
            state,
            registry,
            shutdown,
        }
    }

    /// Stop accepting, force-close every live connection, and wake the
    /// accept loop. Safe to call from every signal delivery; only the
    /// first call does work.
    pub fn begin_shutdown(&self) {
        if !self.state.stop() {
            return;
        }

        self.registry.close_all();
        self.shutdown.trigger();
        tracing::info!("Server shutting down...");
    }
}
