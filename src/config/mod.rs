//! Configuration module for svcwrap
//!
//! This module handles loading and parsing of configuration files,
//! including environment variable expansion and duration parsing.

mod file;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use file::{
    ConfigFile, ConfigPath, config_search_paths, find_config_file, load_config,
    load_config_from_path_or_default,
};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Service settings
    #[serde(default)]
    pub service: ServiceConfig,

    /// Components of the hosted demo application, started in order
    #[serde(default = "default_components")]
    pub components: Vec<ComponentConfig>,
}

/// Service identity and lifecycle limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Name the service is registered under
    #[serde(default = "default_name")]
    pub name: String,

    /// Run in the foreground and stop on Ctrl+C
    #[serde(default)]
    pub debug: bool,

    /// Time allowed for the application to start
    /// Format: "15s", "1m", etc.
    #[serde(default = "default_timeout")]
    pub start_timeout: String,

    /// Time allowed for the application to stop
    #[serde(default = "default_timeout")]
    pub stop_timeout: String,

    /// Path to the JSONL event journal
    /// Supports environment variable and tilde expansion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
}

/// Configuration for a single component of the demo application
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentConfig {
    /// Component name
    pub name: String,

    /// Time the component takes to start
    #[serde(default = "default_delay")]
    pub start_delay: String,

    /// Time the component takes to stop
    #[serde(default = "default_delay")]
    pub stop_delay: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            components: default_components(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            debug: false,
            start_timeout: default_timeout(),
            stop_timeout: default_timeout(),
            journal: None,
        }
    }
}

fn default_name() -> String {
    crate::NAME.to_string()
}

fn default_timeout() -> String {
    "15s".to_string()
}

fn default_delay() -> String {
    "2s".to_string()
}

fn default_components() -> Vec<ComponentConfig> {
    ["component-a", "component-b"]
        .into_iter()
        .map(|name| ComponentConfig {
            name: name.to_string(),
            start_delay: default_delay(),
            stop_delay: default_delay(),
        })
        .collect()
}

impl Config {
    /// Expand paths and parse durations
    pub fn expand(&self) -> crate::Result<ExpandedConfig> {
        let service = &self.service;
        if service.name.trim().is_empty() {
            return Err(crate::Error::Config("Service name must not be empty".to_string()));
        }

        let components = self
            .components
            .iter()
            .map(|c| {
                Ok(ExpandedComponentConfig {
                    name: c.name.clone(),
                    start_delay: parse_duration(&c.start_delay)?,
                    stop_delay: parse_duration(&c.stop_delay)?,
                })
            })
            .collect::<crate::Result<Vec<_>>>()?;

        Ok(ExpandedConfig {
            service: ExpandedServiceConfig {
                name: service.name.clone(),
                debug: service.debug,
                start_timeout: parse_duration(&service.start_timeout)?,
                stop_timeout: parse_duration(&service.stop_timeout)?,
                journal: service
                    .journal
                    .as_ref()
                    .map(|p| expand_path(p).map(PathBuf::from))
                    .transpose()?,
            },
            components,
        })
    }
}

/// Configuration with paths expanded and durations parsed
#[derive(Debug, Clone)]
pub struct ExpandedConfig {
    /// Service settings
    pub service: ExpandedServiceConfig,

    /// Components of the demo application
    pub components: Vec<ExpandedComponentConfig>,
}

/// Service settings with parsed durations
#[derive(Debug, Clone)]
pub struct ExpandedServiceConfig {
    pub name: String,
    pub debug: bool,
    pub start_timeout: Duration,
    pub stop_timeout: Duration,
    /// Resolved journal path
    pub journal: Option<PathBuf>,
}

/// Component settings with parsed durations
#[derive(Debug, Clone)]
pub struct ExpandedComponentConfig {
    pub name: String,
    pub start_delay: Duration,
    pub stop_delay: Duration,
}

/// Expand environment variables and tilde in a path string
pub fn expand_path(path: &str) -> crate::Result<String> {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .map_err(|e| crate::Error::Config(format!("Failed to expand path '{}': {}", path, e)))
}

/// Parse a duration string like "500ms", "10s", "5m", "1h"
pub fn parse_duration(s: &str) -> crate::Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(crate::Error::Config("Empty duration string".to_string()));
    }

    // Find the position where the numeric part ends
    let (num_str, unit) = s
        .char_indices()
        .find(|(_, c)| c.is_alphabetic())
        .map(|(i, _)| (&s[..i], &s[i..]))
        .unwrap_or((s, "s")); // Default to seconds if no unit

    let num: u64 = num_str.trim().parse().map_err(|e| {
        crate::Error::Config(format!("Invalid duration number '{}': {}", num_str, e))
    })?;

    let duration = match unit.to_lowercase().as_str() {
        "ms" | "msec" | "millis" => Duration::from_millis(num),
        "s" | "sec" | "secs" | "second" | "seconds" => Duration::from_secs(num),
        "m" | "min" | "mins" | "minute" | "minutes" => Duration::from_secs(num * 60),
        "h" | "hr" | "hrs" | "hour" | "hours" => Duration::from_secs(num * 60 * 60),
        _ => {
            return Err(crate::Error::Config(format!(
                "Unknown duration unit '{}' in '{}'",
                unit, s
            )));
        }
    };

    Ok(duration)
}
