//! Configuration validation.
//!
//! Semantic validation on top of serde's syntactic checks. Returns all
//! validation errors, not just the first, and runs before a config is
//! accepted into the system.

use std::net::IpAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener.bind_host must not be empty")]
    EmptyBindHost,

    #[error("listener.bind_host is not a valid IP address: {0}")]
    InvalidBindHost(String),

    #[error("listener.backlog must be at least 1")]
    ZeroBacklog,

    #[error("timeouts.idle_secs must be at least 1")]
    ZeroIdleTimeout,

    #[error("connection.read_buffer_bytes must be at least 1")]
    ZeroReadBuffer,
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_host.is_empty() {
        errors.push(ValidationError::EmptyBindHost);
    } else if config.listener.bind_host.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidBindHost(
            config.listener.bind_host.clone(),
        ));
    }

    if config.listener.backlog == 0 {
        errors.push(ValidationError::ZeroBacklog);
    }

    if config.timeouts.idle_secs == 0 {
        errors.push(ValidationError::ZeroIdleTimeout);
    }

    if config.connection.read_buffer_bytes == 0 {
        errors.push(ValidationError::ZeroReadBuffer);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
