//! Live-connection registry and force-close handles.
//!
//! # Responsibilities
//! - Track every connection whose handler has not yet finished
//! - Generate unique connection IDs for tracing
//! - Force-close all registered connections on shutdown
//!
//! All registry operations share one lock, so an add or remove can
//! never interleave with a concurrent close-all.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

/// Global atomic counter for connection IDs.
/// Relaxed ordering is sufficient since we only need uniqueness.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Handle used to force-close a connection from outside its handler.
///
/// Firing the handle wakes the handler's read race; the handler then
/// closes its own stream. The wake-up is stored, so firing before the
/// handler reaches its next read is not lost, and firing after the
/// handler has finished is harmless.
#[derive(Debug, Clone, Default)]
pub struct CloseHandle {
    notify: Arc<Notify>,
}

impl CloseHandle {
    /// Request that the owning handler terminate its drain.
    pub fn force_close(&self) {
        self.notify.notify_one();
    }

    /// Resolve once a force-close has been requested.
    pub async fn closed(&self) {
        self.notify.notified().await;
    }
}

struct RegistryInner {
    connections: HashMap<ConnectionId, CloseHandle>,
    /// Set by the first close_all; entries added afterwards are
    /// force-closed immediately under the same lock.
    draining: bool,
}

/// Thread-safe set of live connections.
///
/// Invariant: an entry is present iff its handler has not yet completed
/// cleanup. Handlers deregister themselves; close_all never removes.
pub struct ConnectionRegistry {
    inner: Mutex<RegistryInner>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                connections: HashMap::new(),
                draining: false,
            }),
        }
    }

    /// Register a connection. Returns the handle its handler races
    /// reads against.
    ///
    /// If shutdown has already begun, the handle comes back fired so
    /// the handler exits on its first read race instead of lingering
    /// until the idle timeout.
    pub fn add(&self, id: ConnectionId) -> CloseHandle {
        let handle = CloseHandle::default();
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        inner.connections.insert(id, handle.clone());
        if inner.draining {
            handle.force_close();
        }
        handle
    }

    /// Deregister a connection. Removing an absent ID is a no-op.
    pub fn remove(&self, id: ConnectionId) {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        inner.connections.remove(&id);
    }

    /// Number of connections whose handlers are still running.
    pub fn active_count(&self) -> usize {
        let inner = self.inner.lock().expect("registry lock poisoned");
        inner.connections.len()
    }

    /// Force-close every registered connection.
    ///
    /// Entries are not removed here; each handler deregisters itself
    /// during cleanup. Firing a handle whose handler already finished
    /// does nothing, so repeated calls are safe.
    pub fn close_all(&self) {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        inner.draining = true;
        for (id, handle) in inner.connections.iter() {
            tracing::debug!(connection_id = %id, "Force-closing connection");
            handle.force_close();
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
