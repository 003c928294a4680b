//! Host for platforms without a native service manager

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

use super::Journal;
use super::host::ServiceHost;
use crate::app::ApplicationLifecycle;
use crate::error::{Error, Result};
use crate::logging::{JsonlWriter, LogEvent, LogEventKind};

/// Runs the application's own blocking run method
///
/// No status protocol and no signal interception; the application decides
/// when it is done. Debug mode has no effect.
pub struct PassthroughHost {
    name: String,
    app: Arc<dyn ApplicationLifecycle>,
    journal: Journal,
}

impl PassthroughHost {
    /// Create a pass-through host
    pub fn new(app: Arc<dyn ApplicationLifecycle>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            app,
            journal: Journal::default(),
        }
    }

    /// Record lifecycle events to a JSONL journal
    pub fn with_journal(mut self, journal: Arc<JsonlWriter>) -> Self {
        self.journal = Journal::new(journal);
        self
    }
}

#[async_trait]
impl ServiceHost for PassthroughHost {
    async fn run(&mut self) -> Result<()> {
        info!(service = %self.name, "Running application");
        self.journal
            .record(|| LogEvent::service_start(&self.name, false));

        let result = self.app.run().await.map_err(|source| {
            error!(service = %self.name, error = %source, "Application run failed");
            Error::RunApplication {
                service: self.name.clone(),
                source,
            }
        });

        self.journal.record(|| {
            let event = LogEvent::new(LogEventKind::ServiceExit).with_service(&self.name);
            match &result {
                Ok(()) => event,
                Err(e) => event.with_error(e.to_string()),
            }
        });
        result
    }

    fn set_debug(&mut self, _enabled: bool) {}

    fn name(&self) -> &str {
        &self.name
    }
}
