//! Config command - show or validate configuration

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::cli::args::ConfigArgs;
use crate::config::{Config, config_search_paths, load_config_from_path_or_default};

/// Example configuration content
fn example_config() -> &'static str {
    r#"# svcwrap configuration file

[service]
# Name the service is registered under with the service manager
name = "svcwrap"

# Run in the foreground and stop on Ctrl+C (Windows only; other
# platforms always run in the foreground)
debug = false

# Time allowed for the hosted application to start and to stop
start_timeout = "15s"
stop_timeout = "15s"

# Optional JSONL journal of lifecycle events
# Supports ~ and $VAR expansion
# journal = "~/.local/state/svcwrap/events.jsonl"

# Components of the demo application. They start in order and stop in
# reverse order.
[[components]]
name = "component-a"
start_delay = "2s"
stop_delay = "2s"

[[components]]
name = "component-b"
start_delay = "2s"
stop_delay = "2s"
"#
}

/// Render a configuration in the requested format
fn render(config: &Config, format: &str) -> Result<String> {
    match format {
        "json" => serde_json::to_string_pretty(config).context("Failed to serialize config"),
        _ => toml::to_string_pretty(config).context("Failed to serialize config"),
    }
}

/// Execute the config command
pub async fn execute(args: ConfigArgs, config_path: Option<PathBuf>) -> Result<()> {
    // Show search paths
    if args.paths {
        println!("Config search paths (in priority order):");
        for (i, cp) in config_search_paths().iter().enumerate() {
            let exists = if cp.path.exists() {
                "\x1b[32m[exists]\x1b[0m"
            } else {
                ""
            };
            println!("  {}. {} {}", i + 1, cp.description, exists);
            println!("     {}", cp.path.display());
        }
        return Ok(());
    }

    if args.example {
        match args.format.as_str() {
            "json" => {
                let config: Config =
                    toml::from_str(example_config()).context("Failed to parse example config")?;
                println!("{}", render(&config, "json")?);
            }
            _ => print!("{}", example_config()),
        }
        return Ok(());
    }

    let config_file = load_config_from_path_or_default(config_path.as_deref())?;
    let source = if config_file.path.as_os_str().is_empty() {
        "built-in defaults".to_string()
    } else {
        config_file.path.display().to_string()
    };

    if args.validate {
        let expanded = config_file.config.expand()?;
        println!("Configuration is valid: {}", source);
        println!(
            "  service '{}' with {} component(s), start timeout {:?}, stop timeout {:?}",
            expanded.service.name,
            expanded.components.len(),
            expanded.service.start_timeout,
            expanded.service.stop_timeout
        );
        return Ok(());
    }

    if args.format != "json" {
        println!("# Configuration from: {}", source);
        println!();
    }
    print!("{}", render(&config_file.config, &args.format)?);
    if args.format == "json" {
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_is_valid() {
        let config: Config = toml::from_str(example_config()).unwrap();
        let expanded = config.expand().unwrap();
        assert_eq!(expanded.service.name, "svcwrap");
        assert_eq!(expanded.components.len(), 2);
    }

    #[test]
    fn test_render_formats() {
        let config = Config::default();
        let toml_out = render(&config, "toml").unwrap();
        assert!(toml_out.contains("[service]"));

        let json_out = render(&config, "json").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json_out).unwrap();
        assert_eq!(value["service"]["name"], "svcwrap");
    }

    #[tokio::test]
    async fn test_validate_rejects_bad_duration() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[service]\nstart_timeout = \"later\"\n").unwrap();

        let args = ConfigArgs {
            validate: true,
            example: false,
            paths: false,
            format: "toml".to_string(),
        };
        let err = execute(args, Some(path)).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::Error>(),
            Some(crate::Error::Config(_))
        ));
    }
}
