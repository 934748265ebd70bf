use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::{CompletionRequest, LanguageModel, prompts, strip_code_fence};
use crate::pipeline::MetadataExtractor;
use crate::types::ApiDescription;
use crate::{Error, Result};

/// Metadata extractor backed by a language model.
pub struct LlmExtractor {
    model: Arc<dyn LanguageModel>,
}

impl LlmExtractor {
    /// Create an extractor that prompts `model`.
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl MetadataExtractor for LlmExtractor {
    #[instrument(level = "debug", skip_all, fields(chars = page_text.len()))]
    async fn extract(&self, page_text: &str, goal: Option<&str>) -> Result<ApiDescription> {
        let request =
            CompletionRequest::json(prompts::EXTRACTION_SYSTEM, prompts::extraction(page_text, goal));

        let answer = self.model.complete(&request).await.map_err(|e| match e {
            Error::Timeout(_) => e,
            other => Error::Extraction(other.to_string()),
        })?;

        let api = parse_description(&answer)?;
        debug!(title = %api.title, endpoints = api.endpoints.len(), "Parsed API description");
        Ok(api)
    }
}

/// Parse the model's JSON answer into an [`ApiDescription`].
///
/// Models are loose with types: examples come back as objects, parameters as
/// objects, missing values as `null`. Those are coerced to the string forms
/// the description carries before deserializing.
pub(crate) fn parse_description(answer: &str) -> Result<ApiDescription> {
    let mut value: Value = serde_json::from_str(strip_code_fence(answer))
        .map_err(|e| Error::Extraction(format!("model answer is not valid JSON: {e}")))?;

    // Some models wrap a single object in an array
    if let Value::Array(items) = &mut value {
        if items.len() == 1 {
            value = items.remove(0);
        }
    }

    let Value::Object(object) = &mut value else {
        return Err(Error::Extraction("model answer is not a JSON object".into()));
    };
    normalize_description(object);

    serde_json::from_value(value)
        .map_err(|e| Error::Extraction(format!("model answer does not describe an API: {e}")))
}

fn normalize_description(object: &mut Map<String, Value>) {
    if object.get("title").is_none_or(Value::is_null) {
        object.insert("title".into(), Value::String(String::new()));
    }
    if object.get("base_url").is_some_and(Value::is_null) {
        object.remove("base_url");
    }
    match object.get_mut("endpoints") {
        Some(Value::Array(endpoints)) => {
            for endpoint in endpoints.iter_mut().filter_map(Value::as_object_mut) {
                normalize_endpoint(endpoint);
            }
        },
        Some(_) => {
            object.remove("endpoints");
        },
        None => {},
    }
}

fn normalize_endpoint(endpoint: &mut Map<String, Value>) {
    // "method" is the other common spelling
    if !endpoint.contains_key("http_method") {
        if let Some(method) = endpoint.remove("method") {
            endpoint.insert("http_method".into(), method);
        }
    }
    for key in ["http_method", "path"] {
        if endpoint.get(key).is_none_or(Value::is_null) {
            endpoint.insert(key.into(), Value::String(String::new()));
        }
    }
    // Keys quoted in the docs are samples, never the operator's credential
    endpoint.remove("api_key");
    for key in ["description", "request_example", "response_example"] {
        if let Some(v) = endpoint.get_mut(key) {
            stringify(v);
        }
    }
    if let Some(flag) = endpoint.get_mut("requires_api_key") {
        if !flag.is_boolean() {
            *flag = Value::Bool(is_truthy(flag));
        }
    }
    if let Some(params) = endpoint.get_mut("parameters") {
        match params {
            Value::Array(items) => items.iter_mut().for_each(stringify),
            Value::Null => {},
            other => {
                let mut single = std::mem::take(other);
                stringify(&mut single);
                *other = Value::Array(vec![single]);
            },
        }
    }
}

/// Lenient reading of a yes/no flag: non-zero numbers and the usual
/// affirmative words count as true.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n.abs() > f64::EPSILON),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "y" | "1" | "required"
        ),
        _ => false,
    }
}

fn stringify(value: &mut Value) {
    match value {
        Value::Null | Value::String(_) => {},
        Value::Object(fields) if fields.contains_key("name") => {
            let name = fields.get("name").map(render).unwrap_or_default();
            let detail: Vec<String> = ["type", "required"]
                .iter()
                .filter_map(|key| fields.get(*key).map(|v| (key, v)))
                .map(|(key, v)| match (*key, v) {
                    ("required", Value::Bool(true)) => "required".to_string(),
                    ("required", Value::Bool(false)) => "optional".to_string(),
                    (_, v) => render(v),
                })
                .collect();
            *value = if detail.is_empty() {
                Value::String(name)
            } else {
                Value::String(format!("{name} ({})", detail.join(", ")))
            };
        },
        other => *other = Value::String(other.to_string()),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
