//! Exit code definitions for svcwrap
//!
//! Provides standardized exit codes for different error conditions.

use crate::Error;

/// Exit codes for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Successful execution
    Success = 0,
    /// General/unspecified error
    GeneralError = 1,
    /// Configuration error (invalid config, missing required settings)
    ConfigError = 2,
    /// The hosted application failed to start
    StartError = 3,
    /// The hosted application failed to stop
    StopError = 4,
}

impl ExitCode {
    /// Pick the exit code for an error returned by a command
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<Error>() {
            Some(Error::StartApplication { .. }) => ExitCode::StartError,
            Some(Error::StopApplication { .. }) => ExitCode::StopError,
            Some(Error::Config(_) | Error::TomlParse(_)) => ExitCode::ConfigError,
            _ => ExitCode::GeneralError,
        }
    }
}

impl From<ExitCode> for u8 {
    fn from(code: ExitCode) -> Self {
        code as u8
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}
