//! Process termination signals
//!
//! Foreground runs stop on Ctrl+C or SIGTERM. The source of those signals is
//! a trait so a run can be driven without touching the real process signals.

use async_trait::async_trait;
use tokio::signal;
use tokio::sync::Notify;

/// Source of process termination signals
#[async_trait]
pub trait TerminationSignal: Send + Sync {
    /// Wait for the next termination signal
    ///
    /// Installs the listener on first use. Returns an error only if the
    /// listener could not be installed.
    async fn recv(&self) -> std::io::Result<()>;
}

/// Termination signals delivered by the operating system
///
/// Ctrl+C everywhere, plus SIGTERM on Unix.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsSignal;

#[async_trait]
impl TerminationSignal for OsSignal {
    async fn recv(&self) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
            tokio::select! {
                res = signal::ctrl_c() => {
                    res?;
                    tracing::debug!("Received Ctrl+C signal");
                }
                _ = terminate.recv() => {
                    tracing::debug!("Received SIGTERM signal");
                }
            }
            Ok(())
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await?;
            tracing::debug!("Received Ctrl+C signal");
            Ok(())
        }
    }
}

/// Termination signal raised by hand
///
/// A signal raised before anyone listens is kept until the next `recv`,
/// like a pending process signal.
#[derive(Debug, Default)]
pub struct ManualSignal {
    notify: Notify,
}

impl ManualSignal {
    /// Create a new manual signal source
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one termination signal
    pub fn raise(&self) {
        self.notify.notify_one();
    }
}

#[async_trait]
impl TerminationSignal for ManualSignal {
    async fn recv(&self) -> std::io::Result<()> {
        self.notify.notified().await;
        Ok(())
    }
}

/// Receive and discard termination signals forever
///
/// Keeps a service-managed process alive when its console sends Ctrl+C or
/// the process receives SIGTERM; only the service manager may stop it.
pub(crate) async fn ignore_signals(signals: &dyn TerminationSignal) {
    loop {
        match signals.recv().await {
            Ok(()) => {
                tracing::info!("Ignoring termination signal while under the service manager");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for termination signals");
                std::future::pending::<()>().await;
            }
        }
    }
}
