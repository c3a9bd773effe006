//! Sidecar keepalive wait
//!
//! After the chains are configured, sidecar deployments keep the process
//! alive so the container is not restarted (observed deployments use an
//! hour or a full day). The wait has a fixed duration but must honor
//! shutdown requests promptly, so it races the timer against SIGTERM and
//! SIGINT rather than sleeping uninterruptibly.

use crate::core::error::Result;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

/// How a keepalive wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepaliveOutcome {
    /// The full duration elapsed.
    Elapsed,
    /// A shutdown signal arrived before the duration elapsed.
    Interrupted(&'static str),
}

/// Blocks for `duration`, returning early on SIGTERM or SIGINT.
///
/// Both outcomes are normal exits for a sidecar; the caller decides what to
/// log and always exits 0.
pub async fn wait(duration: Duration) -> Result<KeepaliveOutcome> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(secs = duration.as_secs(), "keepalive wait started");

    tokio::select! {
        () = tokio::time::sleep(duration) => Ok(KeepaliveOutcome::Elapsed),
        _ = sigterm.recv() => Ok(KeepaliveOutcome::Interrupted("SIGTERM")),
        _ = sigint.recv() => Ok(KeepaliveOutcome::Interrupted("SIGINT")),
    }
}
