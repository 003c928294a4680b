//! JSONL (JSON Lines) journal of service lifecycle events
//!
//! Each entry is written as a single JSON object on one line, so a service
//! run can be reconstructed after the fact (which status reports were sent,
//! which control requests arrived, and what stopped the service).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// Log event kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogEventKind {
    /// Service run began
    ServiceStart,
    /// Application start completed
    ApplicationStarted,
    /// Status reported to the service manager
    StatusReport,
    /// Control request received from the service manager
    ControlRequest,
    /// Stop was requested
    StopRequested,
    /// Application stop completed
    ApplicationStopped,
    /// Service run finished
    ServiceExit,
    /// Error occurred
    Error,
}

impl std::fmt::Display for LogEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogEventKind::ServiceStart => write!(f, "service_start"),
            LogEventKind::ApplicationStarted => write!(f, "application_started"),
            LogEventKind::StatusReport => write!(f, "status_report"),
            LogEventKind::ControlRequest => write!(f, "control_request"),
            LogEventKind::StopRequested => write!(f, "stop_requested"),
            LogEventKind::ApplicationStopped => write!(f, "application_stopped"),
            LogEventKind::ServiceExit => write!(f, "service_exit"),
            LogEventKind::Error => write!(f, "error"),
        }
    }
}

/// A structured log event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    /// Timestamp of the event
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Kind of event
    pub kind: LogEventKind,

    /// Service name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    /// Reported status (for status events)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Control request (for control events)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control: Option<String>,

    /// What triggered the event, e.g. the stop source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Whether the service ran in debug mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,

    /// Error message (for error events)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LogEvent {
    /// Create a new log event with the current timestamp
    pub fn new(kind: LogEventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            service: None,
            status: None,
            control: None,
            reason: None,
            debug: None,
            error: None,
        }
    }

    /// Set the service name
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Set the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Set the error message
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Create a service start event
    pub fn service_start(service: impl Into<String>, debug: bool) -> Self {
        let mut event = Self::new(LogEventKind::ServiceStart).with_service(service);
        event.debug = Some(debug);
        event
    }

    /// Create a status report event
    pub fn status_report(service: impl Into<String>, status: impl ToString) -> Self {
        let mut event = Self::new(LogEventKind::StatusReport).with_service(service);
        event.status = Some(status.to_string());
        event
    }

    /// Create a control request event
    pub fn control_request(service: impl Into<String>, control: impl ToString) -> Self {
        let mut event = Self::new(LogEventKind::ControlRequest).with_service(service);
        event.control = Some(control.to_string());
        event
    }

    /// Create a stop requested event
    pub fn stop_requested(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(LogEventKind::StopRequested)
            .with_service(service)
            .with_reason(reason)
    }

    /// Create an error event
    pub fn error(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LogEventKind::Error)
            .with_service(service)
            .with_error(message)
    }

    /// Serialize the event to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// JSONL file writer with thread-safe buffered output
pub struct JsonlWriter {
    writer: Mutex<BufWriter<File>>,
}

impl std::fmt::Debug for JsonlWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlWriter").finish_non_exhaustive()
    }
}

impl JsonlWriter {
    /// Create a new JSONL writer
    ///
    /// Opens the file for appending, creating it and its parent directory
    /// if they don't exist.
    pub fn new<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Write a log event to the file
    pub fn write(&self, event: &LogEvent) -> std::io::Result<()> {
        let json = event
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| std::io::Error::other("Lock poisoned"))?;

        writeln!(writer, "{}", json)?;
        writer.flush()?;

        Ok(())
    }

    /// Write an event, logging instead of failing on I/O errors
    pub fn record(&self, event: &LogEvent) {
        if let Err(e) = self.write(event) {
            tracing::warn!(kind = %event.kind, error = %e, "Failed to write journal event");
        }
    }

    /// Flush any buffered data to the file
    pub fn flush(&self) -> std::io::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| std::io::Error::other("Lock poisoned"))?;

        writer.flush()
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        // Best effort flush on drop
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_log_event_new() {
        let event = LogEvent::new(LogEventKind::ServiceStart);
        assert_eq!(event.kind, LogEventKind::ServiceStart);
        assert!(event.service.is_none());
    }

    #[test]
    fn test_log_event_serialize() {
        let event = LogEvent::service_start("demo", true);
        let json = event.to_json().unwrap();

        assert!(json.contains("\"kind\":\"service_start\""));
        assert!(json.contains("\"service\":\"demo\""));
        assert!(json.contains("\"debug\":true"));
        assert!(json.contains("\"timestamp\":"));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_log_event_stop_requested() {
        let event = LogEvent::stop_requested("demo", "control_request");
        assert_eq!(event.kind, LogEventKind::StopRequested);
        assert_eq!(event.reason.as_deref(), Some("control_request"));
    }

    #[test]
    fn test_jsonl_writer() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();

        {
            let writer = JsonlWriter::new(&path).unwrap();
            writer.write(&LogEvent::service_start("demo", false)).unwrap();
            writer
                .write(&LogEvent::status_report("demo", "start_pending"))
                .unwrap();
        }

        let file = File::open(&path).unwrap();
        let reader = BufReader::new(file);
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"kind\":\"service_start\""));
        assert!(lines[1].contains("\"status\":\"start_pending\""));
    }

    #[test]
    fn test_jsonl_writer_creates_parent_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("events.jsonl");

        let writer = JsonlWriter::new(&path).unwrap();
        writer.record(&LogEvent::error("demo", "boom"));

        assert!(path.exists());
    }

    #[test]
    fn test_log_event_kind_display() {
        assert_eq!(LogEventKind::ServiceStart.to_string(), "service_start");
        assert_eq!(LogEventKind::StatusReport.to_string(), "status_report");
        assert_eq!(LogEventKind::StopRequested.to_string(), "stop_requested");
    }

    #[test]
    fn test_log_event_deserialize() {
        let event = LogEvent::error("demo", "start timed out").with_reason("start");

        let json = event.to_json().unwrap();
        let parsed: LogEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.kind, LogEventKind::Error);
        assert_eq!(parsed.error.as_deref(), Some("start timed out"));
        assert_eq!(parsed.reason.as_deref(), Some("start"));
    }
}
