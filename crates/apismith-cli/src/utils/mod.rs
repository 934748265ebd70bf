//! Shared helpers for the CLI commands.

pub mod logging;
pub mod terminal;

pub use logging::initialize_logging;
