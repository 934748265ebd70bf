use apismith_core::pipeline::CredentialCollector;
use apismith_core::{Error, Result};
use colored::Colorize;
use tracing::warn;

use crate::utils::terminal;

/// Credential collector that asks the operator at the terminal.
///
/// The answer is masked while typing and taken as-is: an empty answer is a
/// valid credential, and so is input that ends before any line when stdin is
/// not a terminal. Cancelling the terminal prompt (Esc, Ctrl-C) aborts the run.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalCredential;

impl CredentialCollector for TerminalCredential {
    fn collect(&self, api_title: &str) -> Result<String> {
        let title = if api_title.is_empty() {
            "This API"
        } else {
            api_title
        };
        eprintln!(
            "{} {} needs an API key for some endpoints",
            "key:".yellow().bold(),
            title.bold()
        );

        match terminal::ask_secret("Please provide your API key")
            .map_err(|e| Error::Collection(e.to_string()))?
        {
            Some(credential) => Ok(credential),
            // Piped input that ends before a line counts as an empty answer
            None if !terminal::interactive() => {
                warn!("No credential on input; continuing with an empty key");
                Ok(String::new())
            },
            None => Err(Error::Collection("credential prompt cancelled".into())),
        }
    }
}
