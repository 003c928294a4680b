//! Service lifecycle coordinator for the OS service manager
//!
//! # Data Flow
//! ```text
//! run():
//!     spawn background ── managed: registrar.run(dispatcher) ─┐
//!                      └─ debug:   wait started → signal ─────┤ fires stop_requested
//!     start (bounded) → fire started                          │
//!     wait stop_requested ◀───────────────────────────────────┘
//!     stop (bounded)  → fire stopped
//!     join background
//! ```
//!
//! Any start/stop failure fires all three gates before returning so the
//! background task can always finish. The background task in turn releases
//! every gate when it exits, however it exits, so the main sequence can
//! always finish too.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::Journal;
use super::control::ControlDispatcher;
use super::host::ServiceHost;
use super::progress::ProgressGates;
use super::registrar::ServiceRegistrar;
use super::signal::{self, OsSignal, TerminationSignal};
use crate::app::{ApplicationLifecycle, bounded};
use crate::error::{BoxError, Error, Result};
use crate::logging::{JsonlWriter, LogEvent, LogEventKind};

/// Hosts an application under the OS service manager
///
/// A `ManagedHost` runs once: its gates are never reset, so a second call to
/// [`run`](ServiceHost::run) fails with [`Error::AlreadyRun`].
pub struct ManagedHost {
    name: String,
    debug: bool,
    app: Arc<dyn ApplicationLifecycle>,
    registrar: Arc<dyn ServiceRegistrar>,
    signals: Arc<dyn TerminationSignal>,
    progress: ProgressGates,
    journal: Journal,
    has_run: bool,
}

impl ManagedHost {
    /// Create a host bound to the Windows Service Control Manager
    #[cfg(windows)]
    pub fn new(app: Arc<dyn ApplicationLifecycle>, name: impl Into<String>) -> Self {
        Self::with_registrar(app, name, Arc::new(super::windows::ScmRegistrar))
    }

    /// Create a host bound to the given registrar
    pub fn with_registrar(
        app: Arc<dyn ApplicationLifecycle>,
        name: impl Into<String>,
        registrar: Arc<dyn ServiceRegistrar>,
    ) -> Self {
        Self {
            name: name.into(),
            debug: false,
            app,
            registrar,
            signals: Arc::new(OsSignal),
            progress: ProgressGates::new(),
            journal: Journal::default(),
            has_run: false,
        }
    }

    /// Use a different termination signal source
    pub fn with_signals(mut self, signals: Arc<dyn TerminationSignal>) -> Self {
        self.signals = signals;
        self
    }

    /// Record lifecycle events to a JSONL journal
    pub fn with_journal(mut self, journal: Arc<JsonlWriter>) -> Self {
        self.journal = Journal::new(journal);
        self
    }

    /// Whether debug (foreground) mode is enabled
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    fn spawn_background(&self) -> BackgroundTask {
        let progress = self.progress.clone();
        let signals = Arc::clone(&self.signals);
        let journal = self.journal.clone();
        let name = self.name.clone();

        let handle = if self.debug {
            tokio::spawn(run_debug_loop(name, progress, signals, journal))
        } else {
            let registrar = Arc::clone(&self.registrar);
            tokio::spawn(run_registrar(name, progress, registrar, signals, journal))
        };

        BackgroundTask {
            handle: Some(handle),
        }
    }

    async fn run_sequence(&self) -> Result<()> {
        info!(service = %self.name, timeout = ?self.app.start_timeout(), "Starting service");
        if let Err(e) = bounded(self.app.start_timeout(), self.app.start()).await {
            return Err(self.fail("start", e, |service, source| Error::StartApplication {
                service,
                source,
            }));
        }
        self.progress.started.fire();
        self.journal.record(|| {
            LogEvent::new(LogEventKind::ApplicationStarted).with_service(&self.name)
        });
        info!(service = %self.name, "Service started");

        self.progress.stop_requested.wait().await;

        info!(service = %self.name, timeout = ?self.app.stop_timeout(), "Stopping service");
        if let Err(e) = bounded(self.app.stop_timeout(), self.app.stop()).await {
            return Err(self.fail("stop", e, |service, source| Error::StopApplication {
                service,
                source,
            }));
        }
        self.progress.stopped.fire();
        self.journal.record(|| {
            LogEvent::new(LogEventKind::ApplicationStopped).with_service(&self.name)
        });
        info!(service = %self.name, "Service stopped");

        Ok(())
    }

    fn fail(
        &self,
        phase: &str,
        source: BoxError,
        wrap: impl FnOnce(String, BoxError) -> Error,
    ) -> Error {
        self.progress.release_all();
        error!(service = %self.name, phase, error = %source, "Application lifecycle failed");
        self.journal.record(|| {
            LogEvent::error(&self.name, source.to_string()).with_reason(phase)
        });
        wrap(self.name.clone(), source)
    }
}

#[async_trait]
impl ServiceHost for ManagedHost {
    async fn run(&mut self) -> Result<()> {
        if self.has_run {
            return Err(Error::AlreadyRun {
                service: self.name.clone(),
            });
        }
        self.has_run = true;
        self.journal
            .record(|| LogEvent::service_start(&self.name, self.debug));

        let background = self.spawn_background();
        let result = self.run_sequence().await;
        background.join(&self.name).await;

        self.journal.record(|| {
            let event = LogEvent::new(LogEventKind::ServiceExit).with_service(&self.name);
            match &result {
                Ok(()) => event,
                Err(e) => event.with_error(e.to_string()),
            }
        });
        result
    }

    fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Background task handle joined before `run` returns
///
/// Aborts the task if `run` itself is dropped before reaching the join.
struct BackgroundTask {
    handle: Option<JoinHandle<()>>,
}

impl BackgroundTask {
    async fn join(mut self, name: &str) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if let Err(e) = handle.await {
            error!(service = %name, error = %e, "Background service task failed");
        }
    }
}

impl Drop for BackgroundTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Managed mode: serve the service manager until the dispatcher returns
async fn run_registrar(
    name: String,
    progress: ProgressGates,
    registrar: Arc<dyn ServiceRegistrar>,
    signals: Arc<dyn TerminationSignal>,
    journal: Journal,
) {
    // Released however the task ends: normal return, early `Ok`, panic or abort
    let _release = scopeguard::guard(progress.clone(), |progress| progress.release_all());
    let dispatcher = ControlDispatcher::new(name.clone(), progress.clone(), journal.clone());

    let outcome = tokio::select! {
        outcome = registrar.run(&name, dispatcher) => outcome,
        () = signal::ignore_signals(signals.as_ref()) => Ok(()),
    };

    match outcome {
        Err(e) => {
            error!(service = %name, error = %e, "Failed to run service");
            journal.record(|| LogEvent::error(&name, e.to_string()).with_reason("registrar"));
        }
        Ok(()) if !progress.stopped.is_fired() => {
            warn!(service = %name, "Service registrar returned before the application stopped");
            journal.record(|| {
                LogEvent::error(&name, "registrar returned before the application stopped")
                    .with_reason("registrar")
            });
        }
        Ok(()) => {}
    }
}

/// Debug mode: stop on a termination signal instead of a control request
async fn run_debug_loop(
    name: String,
    progress: ProgressGates,
    signals: Arc<dyn TerminationSignal>,
    journal: Journal,
) {
    let _release = scopeguard::guard(progress.clone(), |progress| progress.release_all());
    info!(service = %name, "Running in debug mode");
    progress.started.wait().await;

    let reason = tokio::select! {
        res = signals.recv() => match res {
            Ok(()) => {
                info!(service = %name, "Received termination signal");
                "signal"
            }
            Err(e) => {
                error!(service = %name, error = %e, "Failed to listen for termination signal");
                progress.stop_requested.wait().await;
                "internal"
            }
        },
        _ = progress.stop_requested.wait() => "internal",
    };

    if progress.stop_requested.fire() {
        journal.record(|| LogEvent::stop_requested(&name, reason));
    }
    debug!(service = %name, "Waiting for application to stop");
    progress.stopped.wait().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ManualSignal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingApp {
        starts: AtomicUsize,
        stops: AtomicUsize,
        fail_start: bool,
    }

    #[async_trait]
    impl ApplicationLifecycle for CountingApp {
        async fn start(&self) -> std::result::Result<(), BoxError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            if self.fail_start {
                return Err("start failed".into());
            }
            Ok(())
        }

        async fn stop(&self) -> std::result::Result<(), BoxError> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn start_timeout(&self) -> Duration {
            Duration::from_secs(1)
        }

        fn stop_timeout(&self) -> Duration {
            Duration::from_secs(1)
        }
    }

    /// Registrar that never dispatches and only returns once stop is requested
    struct IdleRegistrar {
        progress_seen: tokio::sync::Mutex<Option<ProgressGates>>,
    }

    #[async_trait]
    impl ServiceRegistrar for IdleRegistrar {
        async fn run(
            &self,
            _name: &str,
            dispatcher: ControlDispatcher,
        ) -> std::result::Result<(), BoxError> {
            let progress = dispatcher.progress().clone();
            *self.progress_seen.lock().await = Some(progress.clone());
            progress.stopped.wait().await;
            Ok(())
        }
    }

    fn debug_host(app: Arc<CountingApp>, signals: Arc<ManualSignal>) -> ManagedHost {
        let registrar = Arc::new(IdleRegistrar {
            progress_seen: tokio::sync::Mutex::new(None),
        });
        let mut host = ManagedHost::with_registrar(app, "test", registrar).with_signals(signals);
        host.set_debug(true);
        host
    }

    #[tokio::test]
    async fn test_aborted_debug_loop_releases_gates() {
        let progress = ProgressGates::new();
        let handle = tokio::spawn(run_debug_loop(
            "test".to_string(),
            progress.clone(),
            Arc::new(ManualSignal::new()),
            Journal::default(),
        ));
        tokio::task::yield_now().await;
        assert!(!progress.stop_requested.is_fired());

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        assert!(progress.started.is_fired());
        assert!(progress.stop_requested.is_fired());
        assert!(progress.stopped.is_fired());
    }

    #[tokio::test]
    async fn test_set_debug() {
        let app = Arc::new(CountingApp::default());
        let mut host = debug_host(app, Arc::new(ManualSignal::new()));
        assert!(host.is_debug());
        host.set_debug(false);
        assert!(!host.is_debug());
        assert_eq!(host.name(), "test");
    }

    #[tokio::test]
    async fn test_debug_signal_stops_service() {
        let app = Arc::new(CountingApp::default());
        let signals = Arc::new(ManualSignal::new());
        let mut host = debug_host(Arc::clone(&app), Arc::clone(&signals));

        signals.raise();
        tokio::time::timeout(Duration::from_secs(5), host.run())
            .await
            .expect("run should finish after the signal")
            .unwrap();

        assert_eq!(app.starts.load(Ordering::SeqCst), 1);
        assert_eq!(app.stops.load(Ordering::SeqCst), 1);
        assert!(host.progress.stopped.is_fired());
    }

    #[tokio::test]
    async fn test_debug_start_failure_skips_stop() {
        let app = Arc::new(CountingApp {
            fail_start: true,
            ..Default::default()
        });
        let mut host = debug_host(Arc::clone(&app), Arc::new(ManualSignal::new()));

        let err = tokio::time::timeout(Duration::from_secs(5), host.run())
            .await
            .expect("run should not hang")
            .unwrap_err();

        assert!(matches!(err, Error::StartApplication { .. }));
        assert_eq!(app.stops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_second_run_is_rejected() {
        let app = Arc::new(CountingApp::default());
        let signals = Arc::new(ManualSignal::new());
        let mut host = debug_host(Arc::clone(&app), Arc::clone(&signals));

        signals.raise();
        host.run().await.unwrap();

        let err = host.run().await.unwrap_err();
        assert!(matches!(err, Error::AlreadyRun { .. }));
        assert_eq!(app.starts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_managed_mode_ignores_termination_signals() {
        let app = Arc::new(CountingApp::default());
        let signals = Arc::new(ManualSignal::new());
        let registrar = Arc::new(IdleRegistrar {
            progress_seen: tokio::sync::Mutex::new(None),
        });
        let mut host = ManagedHost::with_registrar(
            Arc::clone(&app) as Arc<dyn ApplicationLifecycle>,
            "test",
            Arc::clone(&registrar) as Arc<dyn ServiceRegistrar>,
        )
        .with_signals(Arc::clone(&signals) as Arc<dyn TerminationSignal>);

        let run = tokio::spawn(async move { host.run().await });

        signals.raise();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!run.is_finished(), "a signal must not stop a managed service");
        assert_eq!(app.stops.load(Ordering::SeqCst), 0);

        let progress = registrar
            .progress_seen
            .lock()
            .await
            .clone()
            .expect("registrar should have been invoked");
        progress.stop_requested.fire();

        tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("run should finish after stop")
            .unwrap()
            .unwrap();
        assert_eq!(app.stops.load(Ordering::SeqCst), 1);
    }
}
