//! Per-connection protocol handling.
//!
//! # Responsibilities
//! - Greet each client with the fixed banner
//! - Drain inbound bytes until EOF or idle timeout
//! - Classify the outcome and reply on error
//! - Always deregister and close, however the drain ended

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::net::registry::{CloseHandle, ConnectionId, ConnectionRegistry};

/// Greeting sent to every client immediately after accept.
pub const BANNER: &[u8] = b"accio\r\n";

/// Reply sent when a connection times out.
pub const ERROR_REPLY: &[u8] = b"ERROR";

/// How a drain ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrainOutcome {
    /// Peer closed its write side (graceful EOF).
    PeerClosed,
    /// No bytes arrived within the idle timeout.
    IdleTimeout,
    /// The shutdown path force-closed this connection.
    ForceClosed,
    /// Read or write failed for any other reason.
    Io,
}

/// Handle one accepted connection to completion.
///
/// Never returns an error: every failure mode ends in cleanup, and the
/// process must outlive any single connection. Timeout always counts as
/// an error outcome, even when bytes arrived before it.
pub async fn handle(
    mut stream: TcpStream,
    peer: SocketAddr,
    registry: Arc<ConnectionRegistry>,
    idle_timeout: Duration,
    read_buffer_bytes: usize,
) {
    let id = ConnectionId::new();
    let close = registry.add(id);

    let (outcome, received) = drain(&mut stream, &close, idle_timeout, read_buffer_bytes).await;

    match outcome {
        DrainOutcome::PeerClosed => {
            tracing::info!(
                connection_id = %id,
                "Received {} bytes from {}",
                received,
                peer
            );
        }
        DrainOutcome::IdleTimeout => {
            if received == 0 {
                tracing::error!(
                    connection_id = %id,
                    peer = %peer,
                    "No data received for over {} seconds",
                    idle_timeout.as_secs()
                );
            } else {
                tracing::error!(
                    connection_id = %id,
                    peer = %peer,
                    bytes = received,
                    "Connection idle for over {} seconds",
                    idle_timeout.as_secs()
                );
            }
            // The peer may already be gone; a failed reply does not
            // change the outcome.
            if let Err(error) = stream.write_all(ERROR_REPLY).await {
                tracing::debug!(connection_id = %id, error = %error, "Failed to send error reply");
            }
        }
        DrainOutcome::ForceClosed => {
            tracing::debug!(
                connection_id = %id,
                peer = %peer,
                bytes = received,
                "Connection force-closed during shutdown"
            );
        }
        DrainOutcome::Io => {
            // Already logged at the failure site.
        }
    }

    registry.remove(id);
    let _ = stream.shutdown().await;
}

/// Send the banner, then read until EOF, idle timeout, or force-close.
/// Returns the outcome and the total number of bytes received.
async fn drain<S>(
    stream: &mut S,
    close: &CloseHandle,
    idle_timeout: Duration,
    read_buffer_bytes: usize,
) -> (DrainOutcome, u64)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if let Err(error) = stream.write_all(BANNER).await {
        tracing::warn!(error = %error, "Failed to send banner");
        return (DrainOutcome::Io, 0);
    }

    let mut buffer = vec![0u8; read_buffer_bytes];
    let mut received: u64 = 0;

    loop {
        let read = tokio::select! {
            _ = close.closed() => return (DrainOutcome::ForceClosed, received),
            read = tokio::time::timeout(idle_timeout, stream.read(&mut buffer)) => read,
        };

        match read {
            Ok(Ok(0)) => return (DrainOutcome::PeerClosed, received),
            Ok(Ok(n)) => received += n as u64,
            Ok(Err(error)) => {
                tracing::warn!(error = %error, "Read failed");
                return (DrainOutcome::Io, received);
            }
            Err(_elapsed) => return (DrainOutcome::IdleTimeout, received),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drain_counts_bytes_until_peer_close() {
        let (mut server_side, mut client_side) = tokio::io::duplex(64);
        let close = CloseHandle::default();

        let task = tokio::spawn(async move {
            drain(&mut server_side, &close, Duration::from_secs(5), 16).await
        });

        let mut banner = [0u8; 7];
        client_side.read_exact(&mut banner).await.unwrap();
        assert_eq!(&banner, BANNER);

        client_side.write_all(b"hello").await.unwrap();
        client_side.write_all(b"world").await.unwrap();
        drop(client_side);

        let (outcome, received) = task.await.unwrap();
        assert_eq!(outcome, DrainOutcome::PeerClosed);
        assert_eq!(received, 10);
    }

    #[tokio::test]
    async fn drain_times_out_when_idle() {
        let (mut server_side, mut client_side) = tokio::io::duplex(64);
        let close = CloseHandle::default();

        let task = tokio::spawn(async move {
            drain(&mut server_side, &close, Duration::from_millis(50), 16).await
        });

        let mut banner = [0u8; 7];
        client_side.read_exact(&mut banner).await.unwrap();

        let (outcome, received) = task.await.unwrap();
        assert_eq!(outcome, DrainOutcome::IdleTimeout);
        assert_eq!(received, 0);
    }

    #[tokio::test]
    async fn drain_timeout_dominates_partial_data() {
        let (mut server_side, mut client_side) = tokio::io::duplex(64);
        let close = CloseHandle::default();

        let task = tokio::spawn(async move {
            drain(&mut server_side, &close, Duration::from_millis(50), 16).await
        });

        let mut banner = [0u8; 7];
        client_side.read_exact(&mut banner).await.unwrap();
        client_side.write_all(b"partial").await.unwrap();
        // Keep the stream open and go silent.

        let (outcome, received) = task.await.unwrap();
        assert_eq!(outcome, DrainOutcome::IdleTimeout);
        assert_eq!(received, 7);
    }

    #[tokio::test]
    async fn force_close_ends_a_blocked_drain() {
        let (mut server_side, mut client_side) = tokio::io::duplex(64);
        let close = CloseHandle::default();
        let drain_close = close.clone();

        let task = tokio::spawn(async move {
            drain(&mut server_side, &drain_close, Duration::from_secs(60), 16).await
        });

        let mut banner = [0u8; 7];
        client_side.read_exact(&mut banner).await.unwrap();

        close.force_close();

        let (outcome, received) = task.await.unwrap();
        assert_eq!(outcome, DrainOutcome::ForceClosed);
        assert_eq!(received, 0);
    }
}
