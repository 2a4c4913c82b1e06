//! Process lifecycle: OS signals wired to one cancellation token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Owns the process-wide cancellation token.
///
/// Cloning shares the token. The first [`shutdown`](Self::shutdown), from
/// a signal or an explicit call, cancels it; later calls are no-ops.
#[derive(Debug, Clone, Default)]
pub struct ShutdownController {
    token: CancellationToken,
    triggered: Arc<AtomicBool>,
}

impl ShutdownController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token to hand to the queue, the workers and the scanners.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancels the token. Returns `true` only for the call that triggered it.
    pub fn shutdown(&self, reason: &str) -> bool {
        if self.triggered.swap(true, Ordering::SeqCst) {
            debug!(reason, "Shutdown already in progress");
            return false;
        }
        warn!(reason, "Shutting down, no new jobs will be started");
        self.token.cancel();
        true
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Spawns the signal listener. It exits after the first SIGINT/SIGTERM,
    /// or on its own once the token is cancelled by any other means.
    pub fn listen_for_signals(&self) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = controller.token.cancelled() => {
                    debug!("Signal listener stopped");
                }
                signal = shutdown_signal() => {
                    controller.shutdown(signal);
                }
            }
        })
    }
}

/// Waits for Ctrl+C or SIGTERM and names the one received.
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}
