use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::{CompletionRequest, LanguageModel, prompts};
use crate::pipeline::CodeGenerator;
use crate::types::{ApiDescription, TargetLanguage};
use crate::{Error, Result};

/// Code generator backed by a language model.
///
/// Returns the raw answer; fence cleanup happens in the orchestrator.
pub struct LlmGenerator {
    model: Arc<dyn LanguageModel>,
    language: TargetLanguage,
}

impl LlmGenerator {
    /// Create a generator producing `language` source.
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel>, language: TargetLanguage) -> Self {
        Self { model, language }
    }
}

#[async_trait]
impl CodeGenerator for LlmGenerator {
    #[instrument(level = "debug", skip_all, fields(title = %api.title, language = %self.language))]
    async fn generate(&self, api: &ApiDescription) -> Result<String> {
        let metadata = serde_json::to_string_pretty(api)
            .map_err(|e| Error::Generation(format!("cannot encode API description: {e}")))?;

        let request = CompletionRequest::text(
            prompts::codegen_system(self.language),
            prompts::codegen(self.language, &metadata),
        );

        let code = self.model.complete(&request).await.map_err(|e| match e {
            Error::Timeout(_) | Error::Generation(_) => e,
            other => Error::Generation(other.to_string()),
        })?;
        debug!(chars = code.len(), "Received generated source");
        Ok(code)
    }
}
