//! Signal handling for graceful shutdown

use tracing::debug;

/// Waits for a shutdown request from the OS (SIGTERM on unix, ctrl-c
/// everywhere)
pub struct ShutdownSignal;

impl ShutdownSignal {
    pub fn new() -> Self {
        Self
    }

    /// Wait for a shutdown signal
    pub async fn wait(&self) {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");

            tokio::select! {
                _ = sigterm.recv() => {
                    debug!("received SIGTERM");
                }
                _ = tokio::signal::ctrl_c() => {
                    debug!("received ctrl-c");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            debug!("received ctrl-c");
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
