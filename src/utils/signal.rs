//! Signal handling for graceful shutdown

use std::fmt;
use tokio::signal;
use tracing::{info, warn};

/// Signal that ended the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Terminate,
    Interrupt,
    CtrlC,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Terminate => f.write_str("SIGTERM"),
            ShutdownSignal::Interrupt => f.write_str("SIGINT"),
            ShutdownSignal::CtrlC => f.write_str("Ctrl+C"),
        }
    }
}

/// Wait for SIGTERM, SIGINT or Ctrl+C
pub async fn wait_for_shutdown_signal() -> ShutdownSignal {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to register SIGTERM handler: {}", e);
                return ctrl_c().await;
            }
        };

        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to register SIGINT handler: {}", e);
                return ctrl_c().await;
            }
        };

        let received = tokio::select! {
            _ = sigterm.recv() => ShutdownSignal::Terminate,
            _ = sigint.recv() => ShutdownSignal::Interrupt,
            _ = signal::ctrl_c() => ShutdownSignal::CtrlC,
        };
        info!("Received {}, shutting down gracefully...", received);
        received
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await
    }
}

async fn ctrl_c() -> ShutdownSignal {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down gracefully..."),
        Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
    }
    ShutdownSignal::CtrlC
}
