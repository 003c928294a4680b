//! Service hosting module
//!
//! This module adapts a hosted application's start/stop lifecycle to the
//! platform's service manager:
//! - Windows: Service Control Manager handshake ([`ManagedHost`])
//! - Other platforms: direct foreground run ([`PassthroughHost`])

mod control;
mod coordinator;
mod gate;
mod host;
mod passthrough;
mod progress;
mod registrar;
mod signal;
#[cfg(windows)]
mod windows;

pub use control::{ControlDispatcher, ControlRequest, DispatcherExit, StatusReport};
pub use coordinator::ManagedHost;
pub use gate::Gate;
pub use host::{ServiceHost, new_host};
pub use passthrough::PassthroughHost;
pub use progress::ProgressGates;
pub use registrar::ServiceRegistrar;
pub use signal::{ManualSignal, OsSignal, TerminationSignal};
#[cfg(windows)]
pub use windows::ScmRegistrar;

use std::sync::Arc;

use crate::logging::{JsonlWriter, LogEvent};

/// Optional journal shared by the host and its background task
#[derive(Debug, Clone, Default)]
pub(crate) struct Journal(Option<Arc<JsonlWriter>>);

impl Journal {
    pub(crate) fn new(writer: Arc<JsonlWriter>) -> Self {
        Self(Some(writer))
    }

    /// Record an event; the event is only built when a journal is configured
    pub(crate) fn record(&self, event: impl FnOnce() -> LogEvent) {
        if let Some(writer) = &self.0 {
            writer.record(&event());
        }
    }
}
