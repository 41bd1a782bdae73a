//! Post-shutdown drain wait.

use std::time::Duration;

use crate::net::ConnectionRegistry;

/// Wait until every handler has deregistered, or the grace period ends.
///
/// Handlers exit on their own once force-closed; this only bounds how
/// long the process lingers for them.
pub async fn wait_for_drain(registry: &ConnectionRegistry, grace: Duration) {
    let deadline = tokio::time::Instant::now() + grace;

    while registry.active_count() > 0 {
        if tokio::time::Instant::now() >= deadline {
            tracing::warn!(
                remaining = registry.active_count(),
                "Drain grace period expired"
            );
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
