use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::{CompletionRequest, LanguageModel};
use crate::config::LlmConfig;
use crate::{Error, Result};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: Option<f32>,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a client for the model named in `config`.
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("apismith/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .map_err(Error::Network)?;

        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
            api_key: api_key.into(),
            temperature: config.temperature,
        })
    }

    /// Model identifier requests are sent to.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn body<'a>(&self, request: &'a CompletionRequest) -> GenerateRequest<'a> {
        GenerateRequest {
            system_instruction: (!request.system.is_empty()).then(|| Content {
                role: None,
                parts: vec![Part {
                    text: &request.system,
                }],
            }),
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: &request.user,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: request.json_output.then_some("application/json"),
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    #[instrument(level = "debug", skip_all, fields(model = %self.model, json = request.json_output))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&self.body(request))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            warn!(%status, "Model request rejected");
            return Err(Error::Generation(format!(
                "model request failed with HTTP {status}: {}",
                detail.trim()
            )));
        }

        let parsed: GenerateResponse = response.json().await.map_err(transport_error)?;
        let text = parsed.into_text()?;
        debug!(chars = text.len(), "Model answered");
        Ok(text)
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(format!("model request timed out: {e}"))
    } else if e.is_decode() {
        Error::Generation(format!("unreadable model response: {e}"))
    } else {
        Error::Network(e)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl GenerateResponse {
    fn into_text(self) -> Result<String> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(Error::Generation(format!("prompt blocked by the model: {reason}")));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| Error::Generation("model returned no candidates".into()))?;

        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".into());
            return Err(Error::Generation(format!(
                "model returned an empty answer (finish reason: {reason})"
            )));
        }
        Ok(text)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> LlmConfig {
        LlmConfig {
            base_url: server.uri(),
            model: "test-model".to_string(),
            ..LlmConfig::default()
        }
    }

    fn answer(text: &str) -> serde_json::Value {
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        })
    }

    #[tokio::test]
    async fn test_complete_sends_key_and_json_mode() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/test-model:generateContent"))
            .and(header("x-goog-api-key", "k-123"))
            .and(body_partial_json(json!({
                "systemInstruction": {"parts": [{"text": "sys"}]},
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}],
                "generationConfig": {"responseMimeType": "application/json"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer("{\"ok\":true}")))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config_for(&server), "k-123")?;
        let text = client.complete(&CompletionRequest::json("sys", "hello")).await?;

        assert_eq!(text, "{\"ok\":true}");
        Ok(())
    }

    #[tokio::test]
    async fn test_text_parts_are_concatenated() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "import "}, {"text": "requests"}]}}]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config_for(&server), "k")?;
        let text = client.complete(&CompletionRequest::text("", "go")).await?;

        assert_eq!(text, "import requests");
        Ok(())
    }

    #[tokio::test]
    async fn test_http_error_surfaces_api_message() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config_for(&server), "bad")?;
        let err = client
            .complete(&CompletionRequest::text("s", "u"))
            .await
            .unwrap_err();

        assert_eq!(err.category(), "generation");
        assert!(err.to_string().contains("API key not valid"));
        Ok(())
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_error() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config_for(&server), "k")?;
        let err = client
            .complete(&CompletionRequest::text("s", "u"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("SAFETY"));
        Ok(())
    }

    #[tokio::test]
    async fn test_no_candidates_is_error() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config_for(&server), "k")?;
        let err = client
            .complete(&CompletionRequest::text("s", "u"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Generation(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_slow_model_times_out() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(answer("late"))
                    .set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = LlmConfig {
            timeout_secs: 1,
            ..config_for(&server)
        };
        let client = GeminiClient::new(&config, "k")?;
        let err = client
            .complete(&CompletionRequest::text("s", "u"))
            .await
            .unwrap_err();

        assert_eq!(err.category(), "timeout");
        Ok(())
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = GeminiClient::new(&LlmConfig::default(), "super-secret").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("gemini-2.5-flash"));
    }
}
