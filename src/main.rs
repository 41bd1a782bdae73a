//! Minimal TCP Banner Server
//!
//! A small drain-and-greet TCP server built with Tokio.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                 BANNER SERVER                 │
//!                    │                                               │
//!     TCP connect    │  ┌──────────┐     ┌──────────┐               │
//!     ───────────────┼─▶│   net    │────▶│   net    │               │
//!                    │  │ listener │     │ registry │               │
//!                    │  └────┬─────┘     └────┬─────┘               │
//!                    │       │                │                      │
//!                    │       ▼                ▼                      │
//!                    │  ┌──────────────────────────┐                │
//!     accio\r\n      │  │       net handler         │                │
//!     ◀──────────────┼──│  banner → drain → reply   │                │
//!                    │  └──────────────────────────┘                │
//!                    │                                               │
//!                    │  ┌────────────────────────────────────────┐  │
//!                    │  │         Cross-Cutting Concerns          │  │
//!                    │  │  ┌────────┐ ┌───────────┐ ┌──────────┐ │  │
//!                    │  │  │ config │ │ lifecycle │ │observa-  │ │  │
//!                    │  │  │        │ │ shutdown  │ │ bility   │ │  │
//!                    │  │  └────────┘ └───────────┘ └──────────┘ │  │
//!                    │  └────────────────────────────────────────┘  │
//!                    └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use accio_server::config::{self, ServerConfig};
use accio_server::lifecycle::{drain, signals, ServerState, Shutdown, ShutdownController};
use accio_server::net::{ConnectionRegistry, Listener, ListenerError};
use accio_server::observability::logging;

/// Command-line surface. The port is the only required argument.
#[derive(Parser)]
#[command(name = "accio-server")]
#[command(about = "Minimal TCP banner server", long_about = None)]
struct Cli {
    /// Port to listen on.
    #[arg(value_parser = clap::value_parser!(u16).range(1..=65535))]
    port: u16,

    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Usage and invalid-port errors must exit with status 1, so parsing
    // is explicit instead of letting clap pick the exit code.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error)
            if matches!(
                error.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) =>
        {
            let _ = error.print();
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::FAILURE;
        }
    };

    let config = match cli.config.as_deref().map(config::load_config).transpose() {
        Ok(loaded) => loaded.unwrap_or_default(),
        Err(error) => {
            eprintln!("ERROR: {error}");
            return ExitCode::FAILURE;
        }
    };

    let log_level = cli
        .log_level
        .as_deref()
        .unwrap_or(&config.observability.log_level);
    logging::init(log_level);

    tracing::info!(port = cli.port, "accio-server v0.1.0 starting");

    match run(cli.port, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %error, "Fatal startup error");
            ExitCode::FAILURE
        }
    }
}

/// Wire the subsystems together and serve until shutdown completes.
async fn run(port: u16, config: ServerConfig) -> Result<(), ListenerError> {
    let registry = Arc::new(ConnectionRegistry::new());
    let state = Arc::new(ServerState::new());
    let shutdown = Arc::new(Shutdown::new());

    // Bind before installing signal handling: a bind failure is fatal
    // and there is nothing to drain yet.
    let listener = Listener::bind(port, &config, Arc::clone(&registry)).await?;

    let controller = ShutdownController::new(
        Arc::clone(&state),
        Arc::clone(&registry),
        Arc::clone(&shutdown),
    );
    signals::spawn_signal_listener(controller);

    listener.run(Arc::clone(&state), &shutdown).await;

    drain::wait_for_drain(
        &registry,
        Duration::from_secs(config.timeouts.shutdown_grace_secs),
    )
    .await;

    tracing::info!("Shutdown complete");
    Ok(())
}
