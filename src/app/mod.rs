//! Hosted application contract
//!
//! The service host drives an application only through
//! [`ApplicationLifecycle`]: start it, later stop it, each within the
//! timeout the application declares for itself.

mod components;

pub use components::{Component, ComponentApp};

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::error::BoxError;
use crate::service::{OsSignal, TerminationSignal};

/// Start/stop contract of a hosted application
#[async_trait]
pub trait ApplicationLifecycle: Send + Sync {
    /// Start the application
    ///
    /// The call is bounded by [`start_timeout`](Self::start_timeout); when
    /// the limit passes the future is dropped, so implementations should
    /// leave no half-started state behind at their await points.
    async fn start(&self) -> Result<(), BoxError>;

    /// Stop the application, bounded by [`stop_timeout`](Self::stop_timeout)
    async fn stop(&self) -> Result<(), BoxError>;

    /// Time allowed for `start`
    fn start_timeout(&self) -> Duration;

    /// Time allowed for `stop`
    fn stop_timeout(&self) -> Duration;

    /// Run the application in the foreground until a termination signal
    ///
    /// Used on platforms without a service manager.
    async fn run(&self) -> Result<(), BoxError> {
        bounded(self.start_timeout(), self.start()).await?;
        tracing::info!("Application running. Press Ctrl+C to stop.");
        OsSignal.recv().await?;
        bounded(self.stop_timeout(), self.stop()).await
    }
}

/// Await a lifecycle call, failing with `Elapsed` once `limit` passes
pub async fn bounded<F>(limit: Duration, call: F) -> Result<(), BoxError>
where
    F: Future<Output = Result<(), BoxError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(res) => res,
        Err(elapsed) => Err(elapsed.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_passes_result_through() {
        assert!(bounded(Duration::from_secs(1), async { Ok(()) }).await.is_ok());

        let err = bounded(Duration::from_secs(1), async { Err("boom".into()) })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_times_out() {
        let err = bounded(Duration::from_millis(100), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await
        .unwrap_err();

        assert!(err.is::<tokio::time::error::Elapsed>());
    }
}
