//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! server. All types derive Serde traits for deserialization from
//! config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the banner server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind host, backlog).
    pub listener: ListenerConfig,

    /// Per-connection settings.
    pub connection: ConnectionConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host to bind to. The port comes from the command line.
    pub bind_host: String,

    /// Listen backlog passed to the OS.
    pub backlog: u32,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            backlog: 10,
        }
    }
}

/// Per-connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Size of each read from a client, in bytes.
    pub read_buffer_bytes: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            read_buffer_bytes: 1024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Idle read timeout per connection in seconds.
    pub idle_secs: u64,

    /// Bound on waiting for handlers to finish after shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            idle_secs: 10,
            shutdown_grace_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_constants() {
        let config = ServerConfig::default();
        assert_eq!(config.listener.bind_host, "0.0.0.0");
        assert_eq!(config.listener.backlog, 10);
        assert_eq!(config.timeouts.idle_secs, 10);
        assert_eq!(config.connection.read_buffer_bytes, 1024);
    }

    #[test]
    fn partial_toml_keeps_defaults_elsewhere() {
        let config: ServerConfig = toml::from_str("[timeouts]\nidle_secs = 3\n").unwrap();
        assert_eq!(config.timeouts.idle_secs, 3);
        assert_eq!(config.timeouts.shutdown_grace_secs, 5);
        assert_eq!(config.listener.backlog, 10);
    }
}
