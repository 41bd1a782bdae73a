//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Bind listener → Install signal task → Accept loop
//!
//! Shutdown (shutdown.rs):
//!     First signal → running=false → close_all → wake accept loop
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM/SIGQUIT → ShutdownController.begin_shutdown
//!
//! Drain (drain.rs):
//!     Accept loop exited → wait for handlers, bounded by grace period
//! ```
//!
//! # Design Decisions
//! - The running flag is owned state passed by handle, not a global
//! - Shutdown only touches connections through the registry API
//! - Repeated signals are no-ops after the first transition

pub mod drain;
pub mod shutdown;
pub mod signals;

pub use shutdown::{ServerState, Shutdown, ShutdownController};
