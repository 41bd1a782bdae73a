//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop)
//!     → registry.rs (registration, force-close handles)
//!     → handler.rs (banner, drain, outcome, cleanup)
//!
//! Shutdown path:
//!     ShutdownController → registry.close_all()
//!     → every handler's read race wakes → cleanup → deregister
//! ```
//!
//! # Design Decisions
//! - Each stream is owned by exactly one handler task
//! - The registry holds close handles, never sockets
//! - Force-close is a wake-up, not a cross-task socket operation

pub mod handler;
pub mod listener;
pub mod registry;

pub use listener::{Listener, ListenerError};
pub use registry::{ConnectionId, ConnectionRegistry};
