//! `apismith run`: one non-interactive pipeline run.

use anyhow::Result;
use apismith_core::Query;
use apismith_core::pipeline::StaticCredential;

use super::Session;
use crate::cli::SummaryFormat;
use crate::output::RunSummary;
use crate::prompt::TerminalCredential;

/// Run the pipeline once and print a summary.
///
/// A supplied `api_key` answers the credential stage without prompting.
pub async fn execute(
    session: &Session,
    query: Query,
    api_key: Option<String>,
    echo: bool,
    format: SummaryFormat,
) -> Result<()> {
    let language = session.config().output.language;
    let outcome = match api_key {
        Some(key) => session.execute(query, StaticCredential::new(key)).await?,
        None => session.execute(query, TerminalCredential).await?,
    };

    match outcome {
        Ok(state) => {
            let summary = RunSummary::from_state(&state, language);
            match format {
                SummaryFormat::Json => summary.print_json()?,
                SummaryFormat::Text => {
                    if echo || session.config().output.echo_code {
                        print!("{}", state.code());
                    }
                    summary.print_text();
                },
            }
            Ok(())
        },
        Err(failure) => {
            if format == SummaryFormat::Json {
                RunSummary::from_state(&failure.state, language)
                    .with_error(&failure.error)
                    .print_json()?;
            }
            Err(failure.into())
        },
    }
}
