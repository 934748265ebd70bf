#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;
use std::time::Duration;

use assert_cmd::Command;
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CMD_TIMEOUT: Duration = Duration::from_secs(30);

#[allow(dead_code)]
pub const MODEL_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

/// Create an `apismith` command isolated from the caller's environment.
///
/// Config lives in `config_dir`; the model endpoint is `model_base` when given.
pub fn apismith_cmd(config_dir: &Path, model_base: Option<&str>) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("apismith"));
    cmd.timeout(CMD_TIMEOUT);
    for var in [
        "GOOGLE_API_KEY",
        "APISMITH_CREDENTIAL",
        "APISMITH_MODEL",
        "APISMITH_OUTPUT_DIR",
        "APISMITH_LANGUAGE",
        "APISMITH_LLM_BASE_URL",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("APISMITH_CONFIG_DIR", config_dir);
    cmd.env("GEMINI_API_KEY", "test-model-key");
    cmd.env("NO_COLOR", "1");
    if let Some(base) = model_base {
        cmd.env("APISMITH_LLM_BASE_URL", base);
    }
    cmd
}

/// Gemini `generateContent` response carrying `text`.
#[allow(dead_code)]
pub fn model_answer(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

/// Serve a documentation page at `/docs`.
#[allow(dead_code)]
pub async fn mount_docs(server: &MockServer, html: &str) {
    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html.to_string()))
        .mount(server)
        .await;
}

/// Answer the extraction call with `description`.
#[allow(dead_code)]
pub async fn mount_extraction(server: &MockServer, description: &Value) {
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(body_string_contains("Documentation text"))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_answer(&description.to_string())))
        .mount(server)
        .await;
}

/// Answer the code generation call with `code`, only when the request body
/// contains `must_contain`.
#[allow(dead_code)]
pub async fn mount_codegen(server: &MockServer, must_contain: &str, code: &str) {
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(body_string_contains("Structured metadata"))
        .and(body_string_contains(must_contain))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_answer(code)))
        .expect(1)
        .mount(server)
        .await;
}
