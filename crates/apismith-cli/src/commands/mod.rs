//! Command implementations for the `apismith` CLI.

mod completions;
mod config;
mod interactive;
mod run;

use std::sync::Arc;

use anyhow::Result;
use apismith_core::llm::{GeminiClient, LanguageModel, LlmExtractor, LlmGenerator, QuerySplitter};
use apismith_core::pipeline::{CredentialCollector, Pipeline, PipelineFailure, PipelineState};
use apismith_core::{Config, HttpFetcher, Query, SourceWriter};
use tracing::debug;

use crate::error::CliError;
use crate::output::StageProgress;

pub use completions::generate as completions;
pub use config::show as show_config;
pub use interactive::run_loop as interactive;
pub use run::execute as run_once;

/// Resolved configuration plus the shared model client.
///
/// One session serves every run of an invocation, so the interactive loop
/// reuses a single HTTP client for the model.
pub struct Session {
    config: Config,
    model: Arc<dyn LanguageModel>,
    show_progress: bool,
}

impl Session {
    /// Open a session, failing when no model API key is configured.
    pub fn open(config: Config, show_progress: bool) -> Result<Self> {
        let api_key = config.llm.resolve_api_key().map_err(CliError::usage)?;
        let model = GeminiClient::new(&config.llm, api_key)?;
        debug!(model = model.model(), "Model client ready");
        Ok(Self {
            config,
            model: Arc::new(model),
            show_progress,
        })
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub fn splitter(&self) -> QuerySplitter {
        QuerySplitter::new(Arc::clone(&self.model))
    }

    /// Run the pipeline once for `query`.
    pub async fn execute(
        &self,
        query: Query,
        collector: impl CredentialCollector + 'static,
    ) -> Result<std::result::Result<PipelineState, PipelineFailure>> {
        let language = self.config.output.language;
        let progress = StageProgress::new(self.show_progress);
        let observer = progress.clone();

        let pipeline = Pipeline::builder()
            .fetcher(HttpFetcher::new(&self.config.fetch)?)
            .extractor(LlmExtractor::new(Arc::clone(&self.model)))
            .collector(collector)
            .generator(LlmGenerator::new(Arc::clone(&self.model), language))
            .writer(SourceWriter::new(&self.config.output.dir, language))
            .build()?
            .with_progress(move |stage| observer.update(stage));

        Ok(pipeline.run(query).await)
    }
}
