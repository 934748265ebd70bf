//! Orchestrator for a single documentation-to-client run.
//!
//! Drives the stages strictly in sequence: fetch and extract, optionally
//! collect a credential, generate, persist. No stage starts before its
//! predecessor finished, and the first failure ends the run.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::branch::{merge_credential, select_route};
use super::stages::{CodeGenerator, ContentFetcher, CredentialCollector, MetadataExtractor};
use super::state::{PipelineState, Stage};
use crate::sanitize::{clean_generated_code, sanitize_title};
use crate::types::{ApiDescription, Query, Route};
use crate::writer::SourceWriter;
use crate::{Error, Result};

/// Progress callback type, called with each stage the run reaches.
pub type ProgressCallback = Arc<dyn Fn(Stage) + Send + Sync>;

/// A failed run: the error plus the state as it stood when the run stopped.
///
/// The state is in [`Stage::Failed`]; fields populated by earlier stages are
/// intact for diagnostics.
#[derive(Debug, thiserror::Error)]
#[error("pipeline failed after stage '{last_stage}'")]
pub struct PipelineFailure {
    /// Last stage that completed successfully.
    pub last_stage: Stage,
    /// Final state of the run.
    pub state: Box<PipelineState>,
    /// The stage error that aborted the run.
    #[source]
    pub error: Error,
}

/// Sequences the pipeline stages for one run at a time.
///
/// ## Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use apismith_core::llm::{GeminiClient, LlmExtractor, LlmGenerator};
/// use apismith_core::pipeline::{Pipeline, StaticCredential};
/// use apismith_core::{Config, HttpFetcher, Query, SourceWriter};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::load()?;
/// let model = Arc::new(GeminiClient::new(&config.llm, config.llm.resolve_api_key()?)?);
/// let language = config.output.language;
///
/// let pipeline = Pipeline::builder()
///     .fetcher(HttpFetcher::new(&config.fetch)?)
///     .extractor(LlmExtractor::new(model.clone()))
///     .collector(StaticCredential::new("my-key"))
///     .generator(LlmGenerator::new(model, language))
///     .writer(SourceWriter::new(&config.output.dir, language))
///     .build()?;
///
/// let state = pipeline
///     .run(Query::from_parts("https://example.com/docs", "list users"))
///     .await?;
/// println!("wrote {}", state.file_name());
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    fetcher: Box<dyn ContentFetcher>,
    extractor: Box<dyn MetadataExtractor>,
    collector: Box<dyn CredentialCollector>,
    generator: Box<dyn CodeGenerator>,
    writer: SourceWriter,
    progress_callback: Option<ProgressCallback>,
}

impl Pipeline {
    /// Start building a pipeline.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Set progress callback.
    ///
    /// The callback receives every stage the run reaches, including
    /// [`Stage::Failed`].
    #[must_use]
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(Stage) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// The writer used by the persistence stage.
    #[must_use]
    pub const fn writer(&self) -> &SourceWriter {
        &self.writer
    }

    /// Run the pipeline once for `query`.
    ///
    /// Returns the final state on success. On failure the returned
    /// [`PipelineFailure`] carries the failed state and the stage error; no
    /// stage after the failing one ran.
    pub async fn run(&self, query: Query) -> std::result::Result<PipelineState, PipelineFailure> {
        let mut state = PipelineState::new(query);
        self.notify(Stage::Init);

        match self.drive(&mut state).await {
            Ok(()) => {
                info!(file = state.file_name(), "Pipeline run complete");
                Ok(state)
            },
            Err(error) => {
                let last_stage = state.stage();
                state.fail();
                warn!(
                    stage = %last_stage,
                    category = error.category(),
                    error = %error,
                    "Pipeline run failed"
                );
                self.notify(Stage::Failed);
                Err(PipelineFailure {
                    last_stage,
                    state: Box::new(state),
                    error,
                })
            },
        }
    }

    async fn drive(&self, state: &mut PipelineState) -> Result<()> {
        let api = self.extract(state.query()).await?;
        let route = select_route(&api);
        debug!(%route, endpoints = api.endpoints.len(), "Branch selected");
        state.record_extraction(api, route)?;
        self.notify(Stage::Extracted);

        if route == Route::Credential {
            state.advance(Stage::CredentialPending)?;
            self.notify(Stage::CredentialPending);

            let title = state.api_info().map(|api| api.title.clone()).unwrap_or_default();
            let credential = self.collector.collect(&title)?;
            state.record_credential(credential)?;
            self.notify(Stage::CredentialCollected);
        }

        let credential = state.credential().map(str::to_owned);
        let api = state
            .api_info_mut()
            .ok_or_else(|| Error::Other("no API description after extraction".into()))?;
        let code = self.generate(api, credential.as_deref()).await?;
        state.record_code(code)?;
        self.notify(Stage::CodeGenerated);

        let title = state.api_info().map(|api| api.title.clone()).unwrap_or_default();
        let path = self.writer.write(&title, state.code())?;
        state.record_file_name(path.display().to_string())?;
        self.notify(Stage::Persisted);

        Ok(())
    }

    #[instrument(name = "extract", level = "info", skip_all, fields(url = query.url().unwrap_or_default()))]
    async fn extract(&self, query: &Query) -> Result<ApiDescription> {
        // An absent URL reaches the fetcher as "" and fails URL validation there
        let url = query.url().unwrap_or_default();
        let page_text = self.fetcher.fetch(url).await?;
        debug!(chars = page_text.len(), "Page text fetched");

        let mut api = self.extractor.extract(&page_text, query.task()).await?;
        api.title = sanitize_title(&api.title);
        // Credentials start unset; only the collected one is merged later
        for endpoint in &mut api.endpoints {
            endpoint.api_key = None;
        }
        info!(
            title = %api.title,
            endpoints = api.endpoints.len(),
            "Extracted API description"
        );
        Ok(api)
    }

    #[instrument(name = "generate", level = "info", skip_all, fields(title = %api.title))]
    async fn generate(&self, api: &mut ApiDescription, credential: Option<&str>) -> Result<String> {
        let merged = merge_credential(api, credential);
        if merged > 0 {
            debug!(endpoints = merged, "Merged credential into endpoints");
        }

        let raw = self.generator.generate(api).await?;
        let code = clean_generated_code(&raw, self.writer.language());
        if code.trim().is_empty() {
            return Err(Error::Generation("model returned no source code".into()));
        }
        debug!(bytes = code.len(), "Generated client source");
        Ok(code)
    }

    fn notify(&self, stage: Stage) {
        if let Some(cb) = &self.progress_callback {
            cb(stage);
        }
    }
}

/// Builder for [`Pipeline`]; every stage is required.
#[derive(Default)]
pub struct PipelineBuilder {
    fetcher: Option<Box<dyn ContentFetcher>>,
    extractor: Option<Box<dyn MetadataExtractor>>,
    collector: Option<Box<dyn CredentialCollector>>,
    generator: Option<Box<dyn CodeGenerator>>,
    writer: Option<SourceWriter>,
}

impl PipelineBuilder {
    /// Set the content fetcher.
    #[must_use]
    pub fn fetcher(mut self, fetcher: impl ContentFetcher + 'static) -> Self {
        self.fetcher = Some(Box::new(fetcher));
        self
    }

    /// Set the metadata extractor.
    #[must_use]
    pub fn extractor(mut self, extractor: impl MetadataExtractor + 'static) -> Self {
        self.extractor = Some(Box::new(extractor));
        self
    }

    /// Set the credential collector.
    #[must_use]
    pub fn collector(mut self, collector: impl CredentialCollector + 'static) -> Self {
        self.collector = Some(Box::new(collector));
        self
    }

    /// Set the code generator.
    #[must_use]
    pub fn generator(mut self, generator: impl CodeGenerator + 'static) -> Self {
        self.generator = Some(Box::new(generator));
        self
    }

    /// Set the source writer.
    #[must_use]
    pub fn writer(mut self, writer: SourceWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Build the pipeline, failing if a stage is missing.
    pub fn build(self) -> Result<Pipeline> {
        Ok(Pipeline {
            fetcher: self.fetcher.ok_or_else(|| missing("fetcher"))?,
            extractor: self.extractor.ok_or_else(|| missing("extractor"))?,
            collector: self.collector.ok_or_else(|| missing("collector"))?,
            generator: self.generator.ok_or_else(|| missing("generator"))?,
            writer: self.writer.ok_or_else(|| missing("writer"))?,
            progress_callback: None,
        })
    }
}

fn missing(stage: &str) -> Error {
    Error::Config(format!("pipeline is missing its {stage}"))
}

#[cfg(test)]
#[allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::significant_drop_tightening
)]
mod tests {
    use super::*;
    use crate::llm::LlmExtractor;
    use crate::llm::testing::ScriptedModel;
    use crate::types::{Endpoint, TargetLanguage};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use tempfile::TempDir;

    type EventLog = Arc<Mutex<Vec<String>>>;

    // --------------------------------------------------------
    // Mock stages
    // --------------------------------------------------------

    struct MockFetcher {
        log: EventLog,
        fail: bool,
    }

    #[async_trait]
    impl ContentFetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.log.lock().unwrap().push(format!("fetch:{url}"));
            if self.fail {
                return Err(Error::Fetch {
                    url: url.to_string(),
                    reason: "navigation failed".to_string(),
                });
            }
            Ok("Timer API docs POST /timer/".to_string())
        }
    }

    struct MockExtractor {
        log: EventLog,
        api: ApiDescription,
    }

    #[async_trait]
    impl MetadataExtractor for MockExtractor {
        async fn extract(&self, page_text: &str, goal: Option<&str>) -> Result<ApiDescription> {
            self.log
                .lock()
                .unwrap()
                .push(format!("extract:{}:{}", page_text.len(), goal.unwrap_or("-")));
            Ok(self.api.clone())
        }
    }

    struct MockCollector {
        log: EventLog,
        credential: String,
    }

    impl CredentialCollector for MockCollector {
        fn collect(&self, api_title: &str) -> Result<String> {
            self.log.lock().unwrap().push(format!("collect:{api_title}"));
            Ok(self.credential.clone())
        }
    }

    struct MockGenerator {
        log: EventLog,
        seen: Arc<Mutex<Vec<ApiDescription>>>,
        output: Result<String>,
    }

    #[async_trait]
    impl CodeGenerator for MockGenerator {
        async fn generate(&self, api: &ApiDescription) -> Result<String> {
            self.log.lock().unwrap().push("generate".to_string());
            self.seen.lock().unwrap().push(api.clone());
            match &self.output {
                Ok(code) => Ok(code.clone()),
                Err(e) => Err(Error::Generation(e.to_string())),
            }
        }
    }

    struct Harness {
        log: EventLog,
        seen: Arc<Mutex<Vec<ApiDescription>>>,
        dir: TempDir,
        pipeline: Pipeline,
    }

    fn harness(api: ApiDescription, fetch_fails: bool, output: Result<String>) -> Harness {
        let log: EventLog = Arc::default();
        let seen = Arc::default();
        let dir = TempDir::new().unwrap();

        let pipeline = Pipeline::builder()
            .fetcher(MockFetcher {
                log: Arc::clone(&log),
                fail: fetch_fails,
            })
            .extractor(MockExtractor {
                log: Arc::clone(&log),
                api,
            })
            .collector(MockCollector {
                log: Arc::clone(&log),
                credential: "secret-key".to_string(),
            })
            .generator(MockGenerator {
                log: Arc::clone(&log),
                seen: Arc::clone(&seen),
                output,
            })
            .writer(SourceWriter::new(dir.path(), TargetLanguage::Python))
            .build()
            .unwrap();

        Harness {
            log,
            seen,
            dir,
            pipeline,
        }
    }

    fn open_api() -> ApiDescription {
        ApiDescription::new(
            "Users API",
            "https://api.example.com",
            vec![
                Endpoint::new("GET", "/users"),
                Endpoint::new("GET", "/users/{id}"),
            ],
        )
    }

    fn locked_api() -> ApiDescription {
        ApiDescription::new(
            "Timer API",
            "https://api.myintervals.com",
            vec![
                Endpoint::new("GET", "/timer/"),
                Endpoint::new("POST", "/timer/").with_requires_api_key(true),
            ],
        )
    }

    fn fenced_code() -> Result<String> {
        Ok("```python\nimport requests\n\nclass Client:\n    pass\n```".to_string())
    }

    fn query() -> Query {
        Query::from_parts("https://example.com/docs", "list users")
    }

    fn files_in(dir: &TempDir) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    // --------------------------------------------------------
    // Scenarios
    // --------------------------------------------------------

    #[tokio::test]
    async fn test_open_api_skips_credential_stage() {
        let h = harness(open_api(), false, fenced_code());

        let state = h.pipeline.run(query()).await.unwrap();

        assert_eq!(state.stage(), Stage::Persisted);
        assert_eq!(state.route(), Route::CodeGen);
        assert!(state.credential().is_none());
        assert_eq!(
            *h.log.lock().unwrap(),
            vec![
                "fetch:https://example.com/docs".to_string(),
                "extract:27:list users".to_string(),
                "generate".to_string(),
            ]
        );

        assert_eq!(files_in(&h.dir), vec!["Users API.py".to_string()]);
        let written = std::fs::read_to_string(h.dir.path().join("Users API.py")).unwrap();
        assert_eq!(written, "import requests\n\nclass Client:\n    pass\n");
        assert_eq!(state.code(), written);
        assert!(state.file_name().ends_with("Users API.py"));
    }

    #[tokio::test]
    async fn test_locked_endpoint_collects_credential_once_before_generation() {
        let h = harness(locked_api(), false, fenced_code());

        let state = h.pipeline.run(query()).await.unwrap();

        let log = h.log.lock().unwrap().clone();
        let collects = log.iter().filter(|e| e.starts_with("collect:")).count();
        assert_eq!(collects, 1);
        let collect_at = log.iter().position(|e| e == "collect:Timer API").unwrap();
        let generate_at = log.iter().position(|e| e == "generate").unwrap();
        assert!(collect_at < generate_at);

        let seen = h.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].endpoints[0].api_key.is_none());
        assert_eq!(seen[0].endpoints[1].api_key.as_deref(), Some("secret-key"));

        assert_eq!(state.route(), Route::Credential);
        assert_eq!(state.credential(), Some("secret-key"));
        assert_eq!(state.stage(), Stage::Persisted);
    }

    #[tokio::test]
    async fn test_fetch_failure_stops_before_extraction() {
        let h = harness(open_api(), true, fenced_code());

        let failure = h.pipeline.run(query()).await.unwrap_err();

        assert_eq!(failure.last_stage, Stage::Init);
        assert_eq!(failure.state.stage(), Stage::Failed);
        assert!(failure.state.api_info().is_none());
        assert!(matches!(failure.error, Error::Fetch { .. }));
        assert_eq!(h.log.lock().unwrap().len(), 1);
        assert!(files_in(&h.dir).is_empty());
    }

    #[tokio::test]
    async fn test_non_ascii_title_is_sanitized_before_use() {
        let api = ApiDescription::new("Café Réservations API", "", vec![]);
        let h = harness(api, false, fenced_code());

        let state = h.pipeline.run(query()).await.unwrap();

        let title = &state.api_info().unwrap().title;
        assert_eq!(title, "Cafe Reservations API");
        assert!(title.is_ascii());
        assert_eq!(h.seen.lock().unwrap()[0].title, "Cafe Reservations API");
        assert_eq!(files_in(&h.dir), vec!["Cafe Reservations API.py".to_string()]);
    }

    #[tokio::test]
    async fn test_keys_quoted_by_the_model_never_reach_generation() {
        let answer = r#"{"title": "Timer API", "base_url": "https://api.myintervals.com",
            "endpoints": [
                {"http_method": "GET", "path": "/timer/", "requires_api_key": false,
                 "api_key": "sk-doc-sample"},
                {"http_method": "POST", "path": "/timer/", "requires_api_key": true,
                 "api_key": "sk-doc-sample"}
            ]}"#;
        let log: EventLog = Arc::default();
        let seen: Arc<Mutex<Vec<ApiDescription>>> = Arc::default();
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::builder()
            .fetcher(MockFetcher {
                log: Arc::clone(&log),
                fail: false,
            })
            .extractor(LlmExtractor::new(Arc::new(ScriptedModel::replying(answer))))
            .collector(MockCollector {
                log: Arc::clone(&log),
                credential: "secret-key".to_string(),
            })
            .generator(MockGenerator {
                log: Arc::clone(&log),
                seen: Arc::clone(&seen),
                output: fenced_code(),
            })
            .writer(SourceWriter::new(dir.path(), TargetLanguage::Python))
            .build()
            .unwrap();

        let state = pipeline.run(query()).await.unwrap();

        let seen = seen.lock().unwrap();
        assert!(seen[0].endpoints[0].api_key.is_none());
        assert_eq!(seen[0].endpoints[1].api_key.as_deref(), Some("secret-key"));
        let recorded = state.api_info().unwrap();
        assert!(recorded.endpoints[0].api_key.is_none());
        assert_eq!(recorded.endpoints[1].api_key.as_deref(), Some("secret-key"));
    }

    #[tokio::test]
    async fn test_extracted_credentials_are_cleared_on_open_api() {
        let mut api = open_api();
        api.endpoints[0].api_key = Some("placeholder".to_string());
        let h = harness(api, false, fenced_code());

        let state = h.pipeline.run(query()).await.unwrap();

        assert_eq!(state.route(), Route::CodeGen);
        let seen = h.seen.lock().unwrap();
        assert!(seen[0].endpoints.iter().all(|e| e.api_key.is_none()));
    }

    // --------------------------------------------------------
    // Failure handling
    // --------------------------------------------------------

    #[tokio::test]
    async fn test_generation_failure_writes_nothing() {
        let h = harness(
            locked_api(),
            false,
            Err(Error::Generation("quota exceeded".into())),
        );

        let failure = h.pipeline.run(query()).await.unwrap_err();

        assert_eq!(failure.last_stage, Stage::CredentialCollected);
        assert_eq!(failure.error.category(), "generation");
        assert_eq!(failure.state.credential(), Some("secret-key"));
        assert!(failure.state.code().is_empty());
        assert!(files_in(&h.dir).is_empty());
    }

    #[tokio::test]
    async fn test_empty_generation_is_an_error() {
        let h = harness(open_api(), false, Ok("```python\n```".to_string()));

        let failure = h.pipeline.run(query()).await.unwrap_err();

        assert_eq!(failure.last_stage, Stage::Extracted);
        assert!(matches!(failure.error, Error::Generation(_)));
        assert!(files_in(&h.dir).is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_generated_code() {
        let mut h = harness(open_api(), false, fenced_code());
        let blocker = h.dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        h.pipeline.writer = SourceWriter::new(&blocker, TargetLanguage::Python);

        let failure = h.pipeline.run(query()).await.unwrap_err();

        assert_eq!(failure.last_stage, Stage::CodeGenerated);
        assert_eq!(failure.error.category(), "persistence");
        assert!(!failure.state.code().is_empty());
        assert!(failure.state.file_name().is_empty());
    }

    #[tokio::test]
    async fn test_missing_url_fails_in_fetcher() {
        let h = harness(open_api(), true, fenced_code());

        let failure = h
            .pipeline
            .run(Query::new(None, Some("goal".to_string())))
            .await
            .unwrap_err();

        assert_eq!(h.log.lock().unwrap()[0], "fetch:");
        assert_eq!(failure.state.query().task(), Some("goal"));
    }

    // --------------------------------------------------------
    // State properties
    // --------------------------------------------------------

    #[tokio::test]
    async fn test_progress_reports_every_stage_in_order() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&stages);
        let h = harness(locked_api(), false, fenced_code());
        let pipeline = h
            .pipeline
            .with_progress(move |stage| sink.lock().unwrap().push(stage));

        pipeline.run(query()).await.unwrap();

        assert_eq!(
            *stages.lock().unwrap(),
            vec![
                Stage::Init,
                Stage::Extracted,
                Stage::CredentialPending,
                Stage::CredentialCollected,
                Stage::CodeGenerated,
                Stage::Persisted,
            ]
        );
    }

    #[tokio::test]
    async fn test_fields_populate_monotonically() {
        let snapshots = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&snapshots);
        let h = harness(locked_api(), false, fenced_code());
        let dir = h.dir;
        let pipeline = h.pipeline.with_progress(move |stage| sink.lock().unwrap().push(stage));

        let state = pipeline.run(query()).await.unwrap();

        // Every field written by an earlier stage is still present at the end
        assert_eq!(state.query(), &query());
        assert!(state.api_info().is_some());
        assert!(state.credential().is_some());
        assert!(!state.code().is_empty());
        assert!(!state.file_name().is_empty());
        assert!(dir.path().join("Timer API.py").exists());

        let seen = snapshots.lock().unwrap();
        let mut ordered = seen.clone();
        ordered.dedup();
        assert_eq!(*seen, ordered, "no stage is reported twice");
    }

    #[test]
    fn test_builder_requires_all_stages() {
        let err = Pipeline::builder().build().err().unwrap();
        assert!(err.to_string().contains("fetcher"));
    }
}
