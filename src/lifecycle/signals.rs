//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGINT (Ctrl+C) or, on Unix, SIGTERM
//! - Translate either into a [`Shutdown`](super::Shutdown) trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)

use crate::lifecycle::Shutdown;

/// Resolve when the process is asked to stop.
pub async fn wait_for_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    Ok(())
}

/// Trigger `shutdown` on the first stop signal.
pub async fn shutdown_on_signal(shutdown: &Shutdown) {
    match wait_for_signal().await {
        Ok(()) => tracing::info!("Stop signal received, shutting down"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for stop signals, shutting down"),
    }
    shutdown.trigger();
}
