//! The operator loop: ask for a goal and a documentation link, run, repeat.

use anyhow::Result;
use apismith_core::Query;
use colored::Colorize;
use tracing::{info, warn};

use super::Session;
use crate::output::RunSummary;
use crate::prompt::TerminalCredential;
use crate::utils::terminal;

const GOAL_PROMPT: &str = "Developer Tools query";
const RESOURCE_PROMPT: &str = "Resource (web link, swagger html, etc...)";

/// Prompt for runs until the operator types `quit` or `exit`.
///
/// Each iteration is an independent run. A failed run is reported and the
/// loop keeps going; only input errors end the loop early. An empty resource
/// answer lets the model pull the link out of the goal text.
pub async fn run_loop(session: &Session) -> Result<()> {
    eprintln!(
        "{} type {} or {} to leave",
        "apismith".bold(),
        "quit".cyan(),
        "exit".cyan()
    );

    loop {
        let Some(goal) = terminal::ask(GOAL_PROMPT)? else {
            break;
        };
        let goal = goal.trim().to_string();
        if is_exit_command(&goal) {
            break;
        }

        let Some(resource) = terminal::ask(RESOURCE_PROMPT)? else {
            break;
        };

        let Some(query) = build_query(session, goal, resource.trim()).await else {
            continue;
        };
        run_one(session, query).await;
    }

    info!("Operator loop finished");
    Ok(())
}

/// `quit` or `exit` in any letter case.
fn is_exit_command(input: &str) -> bool {
    input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit")
}

async fn build_query(session: &Session, goal: String, resource: &str) -> Option<Query> {
    if !resource.is_empty() {
        return Some(Query::new(
            Some(resource.to_string()),
            Some(goal).filter(|g| !g.is_empty()),
        ));
    }

    if goal.is_empty() {
        eprintln!("{} enter a goal or a documentation link", "note:".yellow());
        return None;
    }

    match session.splitter().split(&goal).await {
        Ok(query) if query.url().is_some() => Some(query),
        Ok(_) => {
            eprintln!(
                "{} no documentation link found in the query; enter it as the resource",
                "note:".yellow()
            );
            None
        },
        Err(e) => {
            report_error(&e);
            None
        },
    }
}

async fn run_one(session: &Session, query: Query) {
    let language = session.config().output.language;
    match session.execute(query, TerminalCredential).await {
        Ok(Ok(state)) => {
            if session.config().output.echo_code {
                print!("{}", state.code());
            }
            RunSummary::from_state(&state, language).print_text();
        },
        Ok(Err(failure)) => {
            warn!(stage = %failure.last_stage, "Run failed");
            report_error(&failure.error);
        },
        Err(e) => eprintln!("{} {e:#}", "error:".red().bold()),
    }
}

fn report_error(error: &apismith_core::Error) {
    eprintln!("{} {error}", "error:".red().bold());
    if error.is_recoverable() {
        eprintln!("{} this may succeed on another try", "hint:".dimmed());
    }
}
