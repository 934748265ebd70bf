//! Language-model adapters.
//!
//! [`LanguageModel`] is the single seam to the hosted model. The extractor,
//! generator and query splitter all share one client behind an `Arc`.

use async_trait::async_trait;

use crate::Result;

mod extractor;
mod gemini;
mod generator;
pub mod prompts;
mod splitter;

pub use extractor::LlmExtractor;
pub use gemini::GeminiClient;
pub use generator::LlmGenerator;
pub use splitter::QuerySplitter;

/// One prompt sent to a language model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// System instruction.
    pub system: String,
    /// User message.
    pub user: String,
    /// Ask the model for a JSON document instead of free text.
    pub json_output: bool,
}

impl CompletionRequest {
    /// Free-text request.
    #[must_use]
    pub fn text(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            json_output: false,
        }
    }

    /// Request whose answer must be a JSON document.
    #[must_use]
    pub fn json(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            json_output: true,
            ..Self::text(system, user)
        }
    }
}

/// A hosted text-completion model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send `request` and return the model's text answer.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Strip a surrounding markdown code fence from a model answer.
///
/// Models in JSON mode occasionally still wrap the document in
/// ```` ```json ```` fences.
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "JSON", ...) on the opening line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}
