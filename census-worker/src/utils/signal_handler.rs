use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[cfg(unix)]
use signal::unix::{signal, SignalKind};

/// Signal types that can trigger shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGTERM - container orchestrator graceful shutdown
    Terminate,
    /// SIGINT - Ctrl+C interactive shutdown
    Interrupt,
    /// SIGQUIT - Quit signal
    Quit,
    /// The token was cancelled from inside the process
    Internal,
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
            ShutdownSignal::Interrupt => write!(f, "SIGINT"),
            ShutdownSignal::Quit => write!(f, "SIGQUIT"),
            ShutdownSignal::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Turns termination signals into cancellation of a shared [`CancellationToken`].
///
/// The dispatcher polls the token between units of work; nothing already in flight is aborted.
pub struct ShutdownController {
    token: CancellationToken,
    shutdown_signal: Option<ShutdownSignal>,
}

impl ShutdownController {
    pub fn new() -> Self {
        Self { token: CancellationToken::new(), shutdown_signal: None }
    }

    /// Token handed to the dispatcher; cancelled once a shutdown signal arrives.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Get the signal that triggered shutdown (if any)
    pub fn shutdown_signal(&self) -> Option<ShutdownSignal> {
        self.shutdown_signal
    }

    /// Wait for any shutdown signal, cancel the token and return which signal it was.
    pub async fn wait_for_shutdown(&mut self) -> Result<ShutdownSignal> {
        let signal = self.wait_for_signal().await?;
        self.shutdown_signal = Some(signal);
        self.token.cancel();
        info!(signal = %signal, "Received shutdown signal");
        Ok(signal)
    }

    #[cfg(unix)]
    async fn wait_for_signal(&self) -> Result<ShutdownSignal> {
        let mut sigterm = signal(SignalKind::terminate()).map_err(|e| anyhow!("SIGTERM handler: {}", e))?;
        let mut sigint = signal(SignalKind::interrupt()).map_err(|e| anyhow!("SIGINT handler: {}", e))?;
        let mut sigquit = signal(SignalKind::quit()).map_err(|e| anyhow!("SIGQUIT handler: {}", e))?;

        info!("Signal handler initialized, listening for SIGTERM, SIGINT and SIGQUIT");

        let signal = tokio::select! {
            _ = sigterm.recv() => ShutdownSignal::Terminate,
            _ = sigint.recv() => ShutdownSignal::Interrupt,
            _ = sigquit.recv() => {
                warn!("Force quit signal received (SIGQUIT)");
                ShutdownSignal::Quit
            }
            _ = self.token.cancelled() => ShutdownSignal::Internal,
        };
        Ok(signal)
    }

    #[cfg(not(unix))]
    async fn wait_for_signal(&self) -> Result<ShutdownSignal> {
        info!("Signal handler initialized, listening for Ctrl+C");

        let signal = tokio::select! {
            result = signal::ctrl_c() => {
                result.map_err(|e| anyhow!("Ctrl+C handler: {}", e))?;
                ShutdownSignal::Interrupt
            }
            _ = self.token.cancelled() => ShutdownSignal::Internal,
        };
        Ok(signal)
    }

    /// Wait for `shutdown_fn` to drain in-flight work, giving up after `timeout`.
    pub async fn handle_graceful_shutdown<F, Fut>(&self, shutdown_fn: F, timeout: Duration) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<()>>,
    {
        let signal = self.shutdown_signal.unwrap_or(ShutdownSignal::Interrupt);
        info!(signal = %signal, timeout_secs = timeout.as_secs(), "Starting graceful shutdown");

        match tokio::time::timeout(timeout, shutdown_fn()).await {
            Ok(Ok(())) => {
                info!("Graceful shutdown completed");
                Ok(())
            }
            Ok(Err(e)) => {
                error!(error = %e, "Graceful shutdown failed");
                Err(e)
            }
            Err(_) => {
                error!(timeout_secs = timeout.as_secs(), "Graceful shutdown timed out, in-flight jobs may be lost");
                Err(anyhow!("Shutdown timeout exceeded"))
            }
        }
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
