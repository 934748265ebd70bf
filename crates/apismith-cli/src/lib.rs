//! apismith CLI: generate API client libraries from documentation pages.
//!
//! The binary is a thin wrapper around [`run`]; commands live in private
//! modules and talk to `apismith-core` for the pipeline itself.

use anyhow::Result;
use apismith_core::{Config, Query};
use clap::Parser;
use is_terminal::IsTerminal;

pub mod cli;
mod commands;
pub mod error;
mod output;
mod prompt;
mod utils;

use crate::cli::{Cli, Commands};
use crate::commands::Session;
use crate::error::CliError;
use crate::utils::initialize_logging;

/// Execute the apismith CLI with the current process arguments.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the requested command
/// fails. Use [`error::exit_code_from_error`] to turn it into an exit code.
pub async fn run() -> Result<()> {
    // Convert Broken pipe panics into a clean exit
    std::panic::set_hook(Box::new(|info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe") || msg.contains("broken pipe") {
            std::process::exit(0);
        }
        eprintln!("{msg}");
    }));

    let cli = Cli::parse();
    initialize_logging(&cli)?;

    let config = load_config(&cli)?;

    match cli.command {
        Some(Commands::Completions { shell }) => commands::completions(shell),
        Some(Commands::Config { path }) => {
            commands::show_config(&config, cli.config.as_deref(), path)?;
        },
        Some(Commands::Run {
            url,
            task,
            api_key,
            echo,
            format,
        }) => {
            let session = Session::open(config, show_progress(cli.quiet))?;
            let query = Query::new(Some(url), task);
            commands::run_once(&session, query, api_key, echo, format).await?;
        },
        Some(Commands::Interactive) | None => {
            let session = Session::open(config, show_progress(cli.quiet))?;
            commands::interactive(&session).await?;
        },
    }
    Ok(())
}

/// Configuration from `--config` or the default location, with environment
/// and flag overrides applied in that order.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::load_from(path).map_err(CliError::usage)?;
            config.apply_env_overrides().map_err(CliError::usage)?;
            config
        },
        None => Config::load().map_err(CliError::usage)?,
    };

    if let Some(dir) = &cli.output_dir {
        config.output.dir.clone_from(dir);
    }
    if let Some(language) = cli.language {
        config.output.language = language;
    }
    Ok(config)
}

fn show_progress(quiet: bool) -> bool {
    !quiet && std::io::stderr().is_terminal()
}
