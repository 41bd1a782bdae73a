//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for SIGINT, SIGTERM and SIGQUIT
//! - Translate the first delivery into the shutdown transition
//!
//! Uses Tokio's signal streams, so deliveries are processed on the
//! runtime rather than inside a signal-handler context.

use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::ShutdownController;

/// Spawn the task that waits for termination signals.
///
/// Repeated signals re-run the controller, which is a no-op after the
/// first transition.
pub fn spawn_signal_listener(controller: ShutdownController) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interrupt =
            signal(SignalKind::interrupt()).expect("Failed to install SIGINT handler");
        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
        let mut quit = signal(SignalKind::quit()).expect("Failed to install SIGQUIT handler");

        loop {
            let received = tokio::select! {
                received = interrupt.recv() => received,
                received = terminate.recv() => received,
                received = quit.recv() => received,
            };

            if received.is_none() {
                break;
            }

            controller.begin_shutdown();
        }
    })
}
