//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → shared by value to the subsystems that need it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no reload mechanism
//! - All fields have defaults so the server runs with no config file
//! - The listen port is a CLI argument, never a config field
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ServerConfig;
