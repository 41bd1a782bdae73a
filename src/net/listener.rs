//! TCP listener and accept loop.
//!
//! # Responsibilities
//! - Bind to the configured address with address reuse and a fixed backlog
//! - Accept incoming connections while the server is running
//! - Spawn a handler task per accepted connection
//! - Graceful handling of accept errors

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket, TcpStream};

use crate::config::ServerConfig;
use crate::lifecycle::{ServerState, Shutdown};
use crate::net::handler;
use crate::net::registry::ConnectionRegistry;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    Bind(std::io::Error),

    /// Failed to accept connection.
    #[error("Failed to accept: {0}")]
    Accept(std::io::Error),
}

/// TCP listener owning the bound socket, the accept loop, and the
/// shared connection registry.
pub struct Listener {
    /// The underlying TCP listener.
    inner: TcpListener,
    /// Registry shared with every handler and the shutdown path.
    registry: Arc<ConnectionRegistry>,
    /// Idle read timeout handed to each handler.
    idle_timeout: Duration,
    /// Read size handed to each handler.
    read_buffer_bytes: usize,
}

impl Listener {
    /// Bind to `<bind_host>:<port>` with SO_REUSEADDR and the
    /// configured backlog. Bind failure is fatal to the caller.
    pub async fn bind(
        port: u16,
        config: &ServerConfig,
        registry: Arc<ConnectionRegistry>,
    ) -> Result<Self, ListenerError> {
        let addr: SocketAddr = format!("{}:{}", config.listener.bind_host, port)
            .parse()
            .map_err(|e| {
                ListenerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
            })?;

        // TcpListener::bind does not expose SO_REUSEADDR or the
        // backlog, so the socket is built by hand.
        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        }
        .map_err(ListenerError::Bind)?;
        socket.set_reuseaddr(true).map_err(ListenerError::Bind)?;
        socket.bind(addr).map_err(ListenerError::Bind)?;

        let listener = socket
            .listen(config.listener.backlog)
            .map_err(ListenerError::Bind)?;

        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            backlog = config.listener.backlog,
            "Server listening"
        );

        Ok(Self {
            inner: listener,
            registry,
            idle_timeout: Duration::from_secs(config.timeouts.idle_secs),
            read_buffer_bytes: config.connection.read_buffer_bytes,
        })
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    /// Accept a single connection.
    async fn accept(&self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        self.inner.accept().await.map_err(ListenerError::Accept)
    }

    /// Run the accept loop until shutdown.
    ///
    /// Transient accept errors are logged and the loop continues; once
    /// the server is stopping they mean the socket is being torn down,
    /// so the loop exits instead. Consumes the listener: the bound
    /// socket is released when this returns, on every exit path.
    pub async fn run(self, state: Arc<ServerState>, shutdown: &Shutdown) {
        let mut shutdown_rx = shutdown.subscribe();

        while state.is_running() {
            let accepted = tokio::select! {
                _ = shutdown_rx.recv() => break,
                accepted = self.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => {
                    tracing::debug!(peer = %peer, "Connection accepted");

                    let registry = Arc::clone(&self.registry);
                    let idle_timeout = self.idle_timeout;
                    let read_buffer_bytes = self.read_buffer_bytes;
                    tokio::spawn(async move {
                        handler::handle(stream, peer, registry, idle_timeout, read_buffer_bytes)
                            .await;
                    });
                }
                Err(error) => {
                    if !state.is_running() {
                        break;
                    }
                    tracing::warn!(error = %error, "Server accept error");
                }
            }
        }

        tracing::info!("Accept loop stopped");
    }
}
