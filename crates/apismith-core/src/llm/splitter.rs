use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, instrument};

use super::{CompletionRequest, LanguageModel, prompts, strip_code_fence};
use crate::types::Query;
use crate::{Error, Result};

/// Splits one free-form sentence into a documentation link and a goal.
///
/// Used by the operator loop when no link was entered separately.
pub struct QuerySplitter {
    model: Arc<dyn LanguageModel>,
}

#[derive(Deserialize)]
struct SplitAnswer {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    task: Option<String>,
}

impl QuerySplitter {
    /// Create a splitter that prompts `model`.
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Ask the model to separate `request` into a [`Query`].
    ///
    /// Blank fields in the answer become `None`.
    #[instrument(level = "debug", skip_all)]
    pub async fn split(&self, request: &str) -> Result<Query> {
        let prompt = CompletionRequest::json(
            prompts::QUERY_SEPARATOR_SYSTEM,
            prompts::query_separator(request),
        );
        let answer = self.model.complete(&prompt).await.map_err(|e| match e {
            Error::Timeout(_) => e,
            other => Error::Extraction(format!("could not split request: {other}")),
        })?;

        let parsed: SplitAnswer = serde_json::from_str(strip_code_fence(&answer))
            .map_err(|e| Error::Extraction(format!("could not split request: {e}")))?;

        let non_blank = |s: Option<String>| {
            s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        let query = Query::new(non_blank(parsed.url), non_blank(parsed.task));
        debug!(url = ?query.url(), task = ?query.task(), "Split request");
        Ok(query)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedModel;

    #[tokio::test]
    async fn test_split_returns_query() {
        let model = Arc::new(ScriptedModel::replying(
            r#"{"url": "https://www.myintervals.com/api/resource.php?r=timer", "task": "start a timer"}"#,
        ));
        let splitter = QuerySplitter::new(model.clone());

        let query = splitter
            .split("use https://www.myintervals.com/api/resource.php?r=timer to start a timer")
            .await
            .unwrap();

        assert_eq!(query.url(), Some("https://www.myintervals.com/api/resource.php?r=timer"));
        assert_eq!(query.task(), Some("start a timer"));
        assert!(model.requests.lock().unwrap()[0].json_output);
    }

    #[tokio::test]
    async fn test_missing_parts_become_none() {
        let model = Arc::new(ScriptedModel::replying(r#"```json
{"url": null, "task": "  "}
```"#));
        let query = QuerySplitter::new(model).split("hello").await.unwrap();

        assert_eq!(query, Query::default());
    }

    #[tokio::test]
    async fn test_unparseable_answer_is_extraction_error() {
        let model = Arc::new(ScriptedModel::replying("I don't know"));
        let err = QuerySplitter::new(model).split("hello").await.unwrap_err();
        assert_eq!(err.category(), "extraction");
    }
}
