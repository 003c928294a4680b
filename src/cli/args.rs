//! Argument structures for CLI commands

use clap::Args;
use clap_complete::Shell;

/// Arguments for the `run` command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Run in the foreground and stop on Ctrl+C instead of serving the service manager
    ///
    /// Only meaningful on Windows; other platforms always run in the foreground.
    #[arg(short, long)]
    pub debug: bool,

    /// Service name (overrides the configuration file)
    #[arg(short, long)]
    pub name: Option<String>,
}

/// Arguments for the `config` command
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Validate configuration only
    #[arg(long)]
    pub validate: bool,

    /// Show example configuration
    #[arg(long)]
    pub example: bool,

    /// Show configuration search paths
    #[arg(long)]
    pub paths: bool,

    /// Output format
    #[arg(short, long, default_value = "toml", value_parser = ["toml", "json"])]
    pub format: String,
}

/// Arguments for the `version` command
#[derive(Args, Debug, Clone)]
pub struct VersionArgs {
    /// Show build details
    #[arg(short, long)]
    pub verbose: bool,
}

/// Arguments for the `completion` command
#[derive(Args, Debug, Clone)]
pub struct CompletionArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
