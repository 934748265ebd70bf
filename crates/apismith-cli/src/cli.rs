//! # CLI Structure and Argument Parsing
//!
//! `apismith` turns a page of API documentation into a generated client
//! library. Without a subcommand it starts the interactive operator loop.
//!
//! ```bash
//! # Interactive loop (default)
//! apismith
//!
//! # One run, no prompts unless the API needs a key
//! apismith run --url https://www.myintervals.com/api/resource.php?r=timer \
//!     --task "start and stop timers" --language python
//!
//! # Inspect configuration
//! apismith config --path
//! ```

use std::path::PathBuf;

use apismith_core::TargetLanguage;
use clap::{Parser, Subcommand, ValueEnum};

/// Main CLI structure for the `apismith` command.
#[derive(Parser, Clone, Debug)]
#[command(name = "apismith")]
#[command(version)]
#[command(about = "apismith - Generate API clients from documentation pages", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable all ANSI colors in output (also respects `NO_COLOR` env)
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Configuration file to use instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory generated clients are written to
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Language of the generated client
    #[arg(long, global = true, value_name = "LANG", value_parser = parse_language)]
    pub language: Option<TargetLanguage>,
}

/// Available subcommands.
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Prompt for goals and documentation links until `quit` or `exit`
    Interactive,

    /// Generate one client without the interactive loop
    Run {
        /// Documentation page to read
        #[arg(long)]
        url: String,

        /// What the client should let you do
        #[arg(long)]
        task: Option<String>,

        /// Credential for endpoints that need one (skips the prompt)
        #[arg(long, env = "APISMITH_CREDENTIAL", hide_env_values = true)]
        api_key: Option<String>,

        /// Print the generated code after writing it
        #[arg(long)]
        echo: bool,

        /// Output format for the run summary
        #[arg(long, value_enum, default_value_t = SummaryFormat::Text)]
        format: SummaryFormat,
    },

    /// Show the resolved configuration
    Config {
        /// Print only the configuration file path
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// How a run summary is printed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormat {
    /// Human-readable, colored
    #[default]
    Text,
    /// Single JSON object on stdout
    Json,
}

fn parse_language(value: &str) -> Result<TargetLanguage, String> {
    value.parse().map_err(|e: apismith_core::Error| e.to_string())
}
