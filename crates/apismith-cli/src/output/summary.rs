//! Run summaries in text and JSON form.

use apismith_core::{PipelineState, Route, Stage, TargetLanguage};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

/// Serializable outcome of one run.
///
/// Built from the final pipeline state. Credentials never appear in it.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub status: &'static str,
    pub stage: Stage,
    pub url: Option<String>,
    pub task: Option<String>,
    pub title: Option<String>,
    pub base_url: Option<String>,
    pub route: Route,
    pub credential_collected: bool,
    pub endpoints: Vec<EndpointSummary>,
    pub language: TargetLanguage,
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorSummary>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct EndpointSummary {
    pub method: String,
    pub path: String,
    pub requires_api_key: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorSummary {
    pub category: &'static str,
    pub message: String,
}

impl RunSummary {
    /// Summarize a finished run.
    pub fn from_state(state: &PipelineState, language: TargetLanguage) -> Self {
        let api = state.api_info();
        Self {
            status: if state.stage() == Stage::Persisted {
                "ok"
            } else {
                "failed"
            },
            stage: state.stage(),
            url: state.query().url().map(str::to_string),
            task: state.query().task().map(str::to_string),
            title: api.map(|a| a.title.clone()),
            base_url: api.map(|a| a.base_url.clone()).filter(|u| !u.is_empty()),
            route: state.route(),
            credential_collected: state.credential().is_some(),
            endpoints: api
                .map(|a| {
                    a.endpoints
                        .iter()
                        .map(|e| EndpointSummary {
                            method: e.http_method.clone(),
                            path: e.path.clone(),
                            requires_api_key: e.requires_api_key,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            language,
            file: Some(state.file_name().to_string()).filter(|f| !f.is_empty()),
            error: None,
            finished_at: Utc::now(),
        }
    }

    /// Attach the error that ended a failed run.
    #[must_use]
    pub fn with_error(mut self, error: &apismith_core::Error) -> Self {
        self.error = Some(ErrorSummary {
            category: error.category(),
            message: error.to_string(),
        });
        self
    }

    /// Print as pretty JSON on stdout.
    pub fn print_json(&self) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }

    /// Print the human-readable form on stdout.
    pub fn print_text(&self) {
        let title = self.title.as_deref().unwrap_or("(untitled API)");
        match &self.file {
            Some(file) => {
                println!(
                    "{} {} {}",
                    "✓".green().bold(),
                    title.bold(),
                    self.detail_line().dimmed()
                );
                println!("  wrote {}", file.cyan());
            },
            None => {
                println!(
                    "{} {} stopped after '{}'",
                    "✗".red().bold(),
                    title.bold(),
                    self.stage
                );
            },
        }
        for endpoint in &self.endpoints {
            let lock = if endpoint.requires_api_key { " (key)" } else { "" };
            println!(
                "    {:<7} {}{}",
                endpoint.method.yellow(),
                endpoint.path,
                lock.dimmed()
            );
        }
    }

    fn detail_line(&self) -> String {
        let count = self.endpoints.len();
        let noun = if count == 1 { "endpoint" } else { "endpoints" };
        let credential = if self.credential_collected {
            ", API key embedded"
        } else {
            ""
        };
        format!("({count} {noun}, {}{credential})", self.language)
    }
}
