//! svcwrap - host an application under the OS service manager

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::env::CompleteEnv;
use std::process::ExitCode;

use svcwrap::cli::exit_code::ExitCode as SvcExitCode;
use svcwrap::cli::{Cli, Commands, commands};
use svcwrap::config::load_config_from_path_or_default;
use svcwrap::logging::{self, LogConfig};

#[tokio::main]
async fn main() -> ExitCode {
    // Handle dynamic shell completion if COMPLETE env var is set
    CompleteEnv::with_factory(Cli::command).complete();

    let cli = Cli::parse();

    match dispatch(cli).await {
        Ok(()) => SvcExitCode::Success.into(),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            SvcExitCode::for_error(&e).into()
        }
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    let log_config = LogConfig::from_flags(cli.verbose, cli.quiet).json(cli.log_json);

    match cli.command {
        Commands::Run(args) => {
            let config_file = load_config_from_path_or_default(cli.config.as_deref())?;
            let config = config_file.config.expand()?;

            let log_config = match &config.service.journal {
                Some(path) => log_config.with_journal_path(path),
                None => log_config,
            };
            let guard = logging::init_with_config(log_config)
                .context("Failed to initialize logging")?;

            commands::run::execute(args, config, guard.journal()).await
        }
        Commands::Config(args) => {
            let _guard = logging::init_with_config(log_config)?;
            commands::config::execute(args, cli.config).await
        }
        Commands::Version(args) => commands::version::execute(args).await,
        Commands::Completion(args) => commands::completion::execute(args).await,
    }
}
