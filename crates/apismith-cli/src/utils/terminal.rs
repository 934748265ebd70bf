//! Operator input.
//!
//! Uses `inquire` prompts on a terminal and plain line reads otherwise, so the
//! operator loop can be driven from a pipe or a script.

use std::io::{self, BufRead};

use anyhow::Result;
use inquire::{InquireError, Password, PasswordDisplayMode, Text};
use is_terminal::IsTerminal;

/// Whether both ends of the conversation are a terminal.
pub fn interactive() -> bool {
    io::stdin().is_terminal() && io::stderr().is_terminal()
}

/// Ask for one line of text.
///
/// Returns `None` when the operator cancels or input ends.
pub fn ask(label: &str) -> Result<Option<String>> {
    if interactive() {
        return cancelled_as_none(Text::new(label).prompt());
    }
    eprint!("{label}: ");
    read_line()
}

/// Ask for a secret without echoing it.
///
/// No confirmation prompt and no validation; an empty answer is returned as
/// an empty string.
pub fn ask_secret(label: &str) -> Result<Option<String>> {
    if interactive() {
        return cancelled_as_none(
            Password::new(label)
                .without_confirmation()
                .with_display_mode(PasswordDisplayMode::Masked)
                .prompt(),
        );
    }
    eprint!("{label}: ");
    read_line()
}

fn read_line() -> Result<Option<String>> {
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        eprintln!();
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn cancelled_as_none(answer: std::result::Result<String, InquireError>) -> Result<Option<String>> {
    match answer {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
