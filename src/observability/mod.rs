//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via the tracing stack
//! - Diagnostics go to stderr, the operator-facing stream
//! - `RUST_LOG` wins over the configured level

pub mod logging;
