//! Minimal TCP Banner Server Library
//!
//! Accepts connections, greets each client with the fixed `accio\r\n`
//! banner, drains inbound bytes until the peer closes or the connection
//! goes idle, and coordinates a signal-driven drain-and-close shutdown.

pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::schema::ServerConfig;
pub use lifecycle::Shutdown;
pub use net::Listener;
