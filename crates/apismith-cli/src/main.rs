//! apismith - generate API clients from documentation pages

use std::process::ExitCode;

use apismith_cli::error::exit_code_from_error;
use colored::Colorize;

#[tokio::main]
async fn main() -> ExitCode {
    match apismith_cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::from(exit_code_from_error(&err))
        },
    }
}
