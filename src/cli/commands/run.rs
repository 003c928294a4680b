//! Run command - host the demo application as a service

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::app::ComponentApp;
use crate::cli::args::RunArgs;
use crate::config::ExpandedConfig;
use crate::logging::JsonlWriter;
use crate::service::{self, ServiceHost};

/// Build the service host for the given arguments and configuration
pub fn build_host(
    args: &RunArgs,
    config: &ExpandedConfig,
    journal: Option<Arc<JsonlWriter>>,
) -> Box<dyn ServiceHost> {
    let name = args
        .name
        .clone()
        .unwrap_or_else(|| config.service.name.clone());
    let app = Arc::new(ComponentApp::from_config(
        &config.service,
        &config.components,
    ));

    let mut host = service::new_host(app, name, journal);
    host.set_debug(args.debug || config.service.debug);
    host
}

/// Execute the run command
pub async fn execute(
    args: RunArgs,
    config: ExpandedConfig,
    journal: Option<Arc<JsonlWriter>>,
) -> Result<()> {
    let mut host = build_host(&args, &config, journal.clone());

    info!(
        service = %host.name(),
        components = config.components.len(),
        "Launching service host"
    );
    let result = host.run().await;

    if let Some(journal) = journal {
        if let Err(e) = journal.flush() {
            tracing::warn!(error = %e, "Failed to flush journal");
        }
    }

    result?;
    info!("Service host exited");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_name_flag_overrides_config() {
        let config = Config::default().expand().unwrap();
        let args = RunArgs {
            debug: true,
            name: Some("override".to_string()),
        };
        let host = build_host(&args, &config, None);
        assert_eq!(host.name(), "override");
    }

    #[test]
    fn test_name_defaults_to_config() {
        let config = Config::default().expand().unwrap();
        let args = RunArgs {
            debug: false,
            name: None,
        };
        let host = build_host(&args, &config, None);
        assert_eq!(host.name(), "svcwrap");
    }
}
