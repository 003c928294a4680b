//! Logging module for svcwrap
//!
//! This module provides logging functionality using tracing and tracing-subscriber.
//! It supports:
//! - Configurable log levels via verbose/quiet flags
//! - Stderr output, human-readable or one JSON object per line
//! - An optional JSONL journal of lifecycle events

pub mod jsonl;

pub use jsonl::{JsonlWriter, LogEvent, LogEventKind};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Logging configuration
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Verbosity level adjustment: -1 for quiet, 0 for normal, +1 for verbose
    pub verbosity: i8,
    /// Emit stderr logs as JSON instead of text
    pub json: bool,
    /// Optional path to the JSONL journal
    pub journal_path: Option<PathBuf>,
}

impl LogConfig {
    /// Create a new log configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from the global CLI flags
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        let config = Self::new();
        if quiet {
            config.quiet()
        } else if verbose {
            config.verbose()
        } else {
            config
        }
    }

    /// Set verbose mode (+1 verbosity)
    pub fn verbose(mut self) -> Self {
        self.verbosity = 1;
        self
    }

    /// Set quiet mode (-1 verbosity)
    pub fn quiet(mut self) -> Self {
        self.verbosity = -1;
        self
    }

    /// Set JSON stderr output
    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Set JSONL journal path
    pub fn with_journal_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.journal_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Get the minimum log level based on verbosity
    fn min_level(&self) -> Level {
        match self.verbosity {
            v if v < 0 => Level::WARN, // quiet: only warnings and errors
            0 => Level::INFO,          // normal: info and above
            _ => Level::DEBUG,         // verbose: debug and above
        }
    }
}

/// Initialize logging with full configuration
///
/// Returns a guard holding the journal, if one was configured. A journal
/// that cannot be opened is reported and skipped rather than failing startup.
pub fn init_with_config(config: LogConfig) -> crate::Result<LogGuard> {
    let level = config.min_level();

    // Allow overriding via RUST_LOG environment variable
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let (text_layer, json_layer) = if config.json {
        let layer = fmt::layer().json().with_writer(std::io::stderr);
        (None, Some(layer))
    } else {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false);
        (Some(layer), None)
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer);

    tracing::subscriber::set_global_default(subscriber).map_err(|e| {
        crate::Error::Other(format!("Failed to set global tracing subscriber: {}", e))
    })?;

    let journal = config.journal_path.as_ref().and_then(|path| {
        JsonlWriter::new(path)
            .map_err(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Failed to open journal");
            })
            .ok()
            .map(Arc::new)
    });
    if let Some(path) = config.journal_path.as_ref().filter(|_| journal.is_some()) {
        tracing::info!(path = %path.display(), "JSONL journal enabled");
    }

    Ok(LogGuard { journal })
}

/// Guard that keeps logging resources alive
///
/// When dropped, the journal is flushed.
#[must_use = "LogGuard must be kept alive for logging to work"]
pub struct LogGuard {
    journal: Option<Arc<JsonlWriter>>,
}

impl LogGuard {
    /// Shared handle to the journal, if configured
    pub fn journal(&self) -> Option<Arc<JsonlWriter>> {
        self.journal.clone()
    }
}
