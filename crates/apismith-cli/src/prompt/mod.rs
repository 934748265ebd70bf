//! Interactive prompts used by pipeline runs.

mod credential;

pub use credential::TerminalCredential;
