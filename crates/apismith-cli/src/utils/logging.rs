//! Logging initialization and color control.

use anyhow::Result;
use colored::control as color_control;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::cli::{Cli, Commands, SummaryFormat};

/// Initialize the logging subsystem based on CLI flags.
///
/// WARN by default, DEBUG with `--verbose`, ERROR with `--quiet`. JSON run
/// summaries also drop to ERROR unless `--verbose` was given, so stdout stays
/// machine-readable and stderr stays quiet.
///
/// # Errors
///
/// Returns an error if the global tracing subscriber cannot be set.
pub fn initialize_logging(cli: &Cli) -> Result<()> {
    let machine_output = matches!(
        cli.command,
        Some(Commands::Run {
            format: SummaryFormat::Json,
            ..
        })
    );

    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet || machine_output {
        Level::ERROR
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_ansi(!colors_disabled(cli))
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    if colors_disabled(cli) || machine_output {
        color_control::set_override(false);
    }
    Ok(())
}

fn colors_disabled(cli: &Cli) -> bool {
    cli.no_color || std::env::var_os("NO_COLOR").is_some()
}
