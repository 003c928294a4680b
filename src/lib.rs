//! svcwrap - host an application under the OS service manager
//!
//! This library adapts an application's start/stop lifecycle to the
//! platform's service manager. On Windows the application is driven through
//! the Service Control Manager handshake; elsewhere it runs in the
//! foreground until a termination signal.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod service;

pub use error::{BoxError, Error, Result};

/// Package version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name
pub const NAME: &str = env!("CARGO_PKG_NAME");
