//! Service manager control protocol
//!
//! The service manager talks to a hosted service through a pair of channels:
//! it sends [`ControlRequest`]s in and expects [`StatusReport`]s back. The
//! [`ControlDispatcher`] implements the service side of that handshake:
//!
//! ```text
//! StartPending ──(started)──▶ Running ──(Stop/Shutdown | stop_requested)──▶ StopPending ──(stopped)──▶ return
//!                               │  ▲
//!                               └──┘ Interrogate echoes the current status
//! ```

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::Journal;
use super::progress::ProgressGates;
use crate::logging::LogEvent;

/// Raw control code for a stop request
pub const CONTROL_STOP: u32 = 0x0000_0001;
/// Raw control code for an interrogate request
pub const CONTROL_INTERROGATE: u32 = 0x0000_0004;
/// Raw control code for a system shutdown notification
pub const CONTROL_SHUTDOWN: u32 = 0x0000_0005;

/// Control request delivered by the service manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    /// Report the current status again
    Interrogate,
    /// Stop the service
    Stop,
    /// The system is shutting down
    Shutdown,
    /// Any control the dispatcher does not handle
    Unknown(u32),
}

impl ControlRequest {
    /// Map a raw control code to a request
    pub fn from_code(code: u32) -> Self {
        match code {
            CONTROL_STOP => ControlRequest::Stop,
            CONTROL_INTERROGATE => ControlRequest::Interrogate,
            CONTROL_SHUTDOWN => ControlRequest::Shutdown,
            other => ControlRequest::Unknown(other),
        }
    }

    /// Raw control code of this request
    pub fn code(&self) -> u32 {
        match self {
            ControlRequest::Stop => CONTROL_STOP,
            ControlRequest::Interrogate => CONTROL_INTERROGATE,
            ControlRequest::Shutdown => CONTROL_SHUTDOWN,
            ControlRequest::Unknown(code) => *code,
        }
    }
}

impl std::fmt::Display for ControlRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlRequest::Interrogate => write!(f, "interrogate"),
            ControlRequest::Stop => write!(f, "stop"),
            ControlRequest::Shutdown => write!(f, "shutdown"),
            ControlRequest::Unknown(code) => write!(f, "unknown({})", code),
        }
    }
}

/// Status reported back to the service manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusReport {
    /// The application is starting
    StartPending,
    /// The application is running
    Running {
        /// Stop requests are accepted
        accepts_stop: bool,
        /// Shutdown notifications are accepted
        accepts_shutdown: bool,
    },
    /// The application is stopping
    StopPending,
}

impl StatusReport {
    /// Running status accepting both stop and shutdown, the only one the dispatcher sends
    pub const RUNNING: StatusReport = StatusReport::Running {
        accepts_stop: true,
        accepts_shutdown: true,
    };
}

impl std::fmt::Display for StatusReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusReport::StartPending => write!(f, "start_pending"),
            StatusReport::Running { .. } => write!(f, "running"),
            StatusReport::StopPending => write!(f, "stop_pending"),
        }
    }
}

/// Value handed back to the service manager when the dispatcher returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherExit {
    /// Whether `exit_code` is service specific rather than a system code
    pub service_specific: bool,
    /// Exit code reported with the final stopped status
    pub exit_code: u32,
}

/// Service side of the service manager handshake
///
/// Created by the coordinator and handed to a
/// [`ServiceRegistrar`](super::ServiceRegistrar), which drives it with live
/// request and status channels.
#[derive(Debug)]
pub struct ControlDispatcher {
    name: String,
    progress: ProgressGates,
    journal: Journal,
}

impl ControlDispatcher {
    pub(crate) fn new(name: String, progress: ProgressGates, journal: Journal) -> Self {
        Self {
            name,
            progress,
            journal,
        }
    }

    /// Name of the service this dispatcher answers for
    pub fn service_name(&self) -> &str {
        &self.name
    }

    pub(crate) fn progress(&self) -> &ProgressGates {
        &self.progress
    }

    /// Run the handshake until the application has stopped
    ///
    /// Pending control requests are answered before a stop triggered from
    /// elsewhere is observed. A closed request channel ends the running
    /// phase like a stop request.
    pub async fn execute(
        self,
        mut requests: mpsc::Receiver<ControlRequest>,
        changes: mpsc::Sender<StatusReport>,
    ) -> DispatcherExit {
        let mut reporter = StatusReporter::new(&self.name, changes, &self.journal);

        reporter.report(StatusReport::StartPending).await;
        self.progress.started.wait().await;
        reporter.report(StatusReport::RUNNING).await;

        let reason = loop {
            tokio::select! {
                biased;

                request = requests.recv() => {
                    let Some(request) = request else {
                        debug!(service = %self.name, "Control request channel closed");
                        break "request_channel_closed";
                    };
                    self.journal
                        .record(|| LogEvent::control_request(&self.name, request));

                    match request {
                        ControlRequest::Interrogate => reporter.echo().await,
                        ControlRequest::Stop | ControlRequest::Shutdown => {
                            info!(service = %self.name, cmd = %request, "Received stop control request");
                            break "control_request";
                        }
                        ControlRequest::Unknown(code) => {
                            info!(service = %self.name, cmd = code, "Unexpected control request");
                        }
                    }
                }

                _ = self.progress.stop_requested.wait() => {
                    debug!(service = %self.name, "Stop requested outside the service manager");
                    break "internal";
                }
            }
        };

        reporter.report(StatusReport::StopPending).await;
        if self.progress.stop_requested.fire() {
            self.journal
                .record(|| LogEvent::stop_requested(&self.name, reason));
        }
        self.progress.stopped.wait().await;

        DispatcherExit::default()
    }
}

/// Sends status reports and remembers the last one for interrogation
struct StatusReporter<'a> {
    name: &'a str,
    changes: mpsc::Sender<StatusReport>,
    journal: &'a Journal,
    current: StatusReport,
}

impl<'a> StatusReporter<'a> {
    fn new(name: &'a str, changes: mpsc::Sender<StatusReport>, journal: &'a Journal) -> Self {
        Self {
            name,
            changes,
            journal,
            current: StatusReport::StartPending,
        }
    }

    async fn report(&mut self, status: StatusReport) {
        self.current = status;
        self.send(status).await;
    }

    async fn echo(&mut self) {
        self.send(self.current).await;
    }

    async fn send(&self, status: StatusReport) {
        debug!(service = %self.name, status = %status, "Reporting status");
        self.journal
            .record(|| LogEvent::status_report(self.name, status));
        if self.changes.send(status).await.is_err() {
            debug!(service = %self.name, status = %status, "Status receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn dispatcher(progress: &ProgressGates) -> ControlDispatcher {
        ControlDispatcher::new("test".to_string(), progress.clone(), Journal::default())
    }

    async fn drain(mut rx: mpsc::Receiver<StatusReport>) -> Vec<StatusReport> {
        let mut out = Vec::new();
        while let Some(status) = rx.recv().await {
            out.push(status);
        }
        out
    }

    #[test]
    fn test_control_request_codes() {
        assert_eq!(ControlRequest::from_code(1), ControlRequest::Stop);
        assert_eq!(ControlRequest::from_code(4), ControlRequest::Interrogate);
        assert_eq!(ControlRequest::from_code(5), ControlRequest::Shutdown);
        assert_eq!(ControlRequest::from_code(999), ControlRequest::Unknown(999));
        assert_eq!(ControlRequest::Unknown(999).code(), 999);
    }

    #[test]
    fn test_display() {
        assert_eq!(ControlRequest::Unknown(7).to_string(), "unknown(7)");
        assert_eq!(StatusReport::RUNNING.to_string(), "running");
        assert_eq!(StatusReport::StopPending.to_string(), "stop_pending");
    }

    #[tokio::test]
    async fn test_holds_start_pending_until_started() {
        let progress = ProgressGates::new();
        let (_req_tx, req_rx) = mpsc::channel(8);
        let (chg_tx, mut chg_rx) = mpsc::channel(8);

        let task = tokio::spawn(dispatcher(&progress).execute(req_rx, chg_tx));

        assert_eq!(chg_rx.recv().await, Some(StatusReport::StartPending));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(chg_rx.try_recv().is_err(), "must not report running before start");

        progress.started.fire();
        assert_eq!(chg_rx.recv().await, Some(StatusReport::RUNNING));

        progress.stop_requested.fire();
        assert_eq!(chg_rx.recv().await, Some(StatusReport::StopPending));
        assert!(!task.is_finished());

        progress.stopped.fire();
        assert_eq!(task.await.unwrap(), DispatcherExit::default());
    }

    #[tokio::test]
    async fn test_stop_request_fires_stop_requested() {
        let progress = ProgressGates::new();
        let (req_tx, req_rx) = mpsc::channel(8);
        let (chg_tx, chg_rx) = mpsc::channel(8);
        progress.started.fire();

        let task = tokio::spawn(dispatcher(&progress).execute(req_rx, chg_tx));
        req_tx.send(ControlRequest::Shutdown).await.unwrap();

        progress.stop_requested.wait().await;
        progress.stopped.fire();
        task.await.unwrap();

        assert_eq!(
            drain(chg_rx).await,
            vec![
                StatusReport::StartPending,
                StatusReport::RUNNING,
                StatusReport::StopPending
            ]
        );
    }

    #[tokio::test]
    async fn test_interrogate_echoes_and_unknown_is_ignored() {
        let progress = ProgressGates::new();
        let (req_tx, req_rx) = mpsc::channel(8);
        let (chg_tx, chg_rx) = mpsc::channel(16);
        progress.started.fire();
        progress.stopped.fire();

        req_tx.send(ControlRequest::Interrogate).await.unwrap();
        req_tx.send(ControlRequest::Unknown(999)).await.unwrap();
        req_tx.send(ControlRequest::Interrogate).await.unwrap();
        req_tx.send(ControlRequest::Stop).await.unwrap();

        dispatcher(&progress).execute(req_rx, chg_tx).await;

        assert_eq!(
            drain(chg_rx).await,
            vec![
                StatusReport::StartPending,
                StatusReport::RUNNING,
                StatusReport::RUNNING,
                StatusReport::RUNNING,
                StatusReport::StopPending
            ]
        );
    }

    #[tokio::test]
    async fn test_closed_request_channel_ends_running_phase() {
        let progress = ProgressGates::new();
        let (req_tx, req_rx) = mpsc::channel(8);
        let (chg_tx, chg_rx) = mpsc::channel(8);
        progress.started.fire();
        progress.stopped.fire();
        drop(req_tx);

        dispatcher(&progress).execute(req_rx, chg_tx).await;

        assert!(progress.stop_requested.is_fired());
        assert_eq!(drain(chg_rx).await.last(), Some(&StatusReport::StopPending));
    }

    #[tokio::test]
    async fn test_dropped_status_receiver_is_tolerated() {
        let progress = ProgressGates::new();
        let (_req_tx, req_rx) = mpsc::channel(8);
        let (chg_tx, chg_rx) = mpsc::channel(8);
        drop(chg_rx);
        progress.release_all();

        let exit = dispatcher(&progress).execute(req_rx, chg_tx).await;
        assert_eq!(exit.exit_code, 0);
    }
}
