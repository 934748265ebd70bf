//! Core data types: the operator query, extracted API metadata, and the
//! target language of the generated client.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// An operator request: where the documentation lives and what to build.
///
/// Either field may be absent; the pipeline passes absent values through to
/// the extractor unchanged. A `Query` is immutable once constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    task: Option<String>,
}

impl Query {
    /// Create a query from optional URL and task strings.
    #[must_use]
    pub const fn new(url: Option<String>, task: Option<String>) -> Self {
        Self { url, task }
    }

    /// Create a query with both fields populated.
    #[must_use]
    pub fn from_parts(url: impl Into<String>, task: impl Into<String>) -> Self {
        Self::new(Some(url.into()), Some(task.into()))
    }

    /// Documentation URL, if provided.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Developer goal, if provided.
    #[must_use]
    pub fn task(&self) -> Option<&str> {
        self.task.as_deref()
    }
}

/// One API operation as reported by the metadata extractor.
///
/// Field names follow the JSON object the extractor prompt asks the model for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// HTTP method (`GET`, `POST`, ...). Not validated against a closed set.
    pub http_method: String,
    /// Request path, e.g. `/api/v1/users`.
    pub path: String,
    /// Short explanation of what the endpoint does.
    #[serde(default)]
    pub description: Option<String>,
    /// Parameter descriptions in documentation order.
    #[serde(default)]
    pub parameters: Option<Vec<String>>,
    /// Whether calling the endpoint needs a credential.
    #[serde(default)]
    pub requires_api_key: bool,
    /// Example request, verbatim.
    #[serde(default)]
    pub request_example: Option<String>,
    /// Example response, verbatim.
    #[serde(default)]
    pub response_example: Option<String>,
    /// Credential merged in by the orchestrator before code generation.
    ///
    /// Never read from input: a key quoted in the documentation is not the
    /// operator's credential.
    #[serde(default, skip_deserializing)]
    pub api_key: Option<String>,
}

impl Endpoint {
    /// Create an endpoint with just a method and path.
    #[must_use]
    pub fn new(http_method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            http_method: http_method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Mark whether this endpoint needs a credential.
    #[must_use]
    pub const fn with_requires_api_key(mut self, requires: bool) -> Self {
        self.requires_api_key = requires;
        self
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One documented API surface.
///
/// Endpoint order is the extraction order and is preserved through code
/// generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDescription {
    /// API title. Sanitized by the orchestrator immediately after extraction.
    pub title: String,
    /// Base URL, empty when the documentation does not state one.
    #[serde(default)]
    pub base_url: String,
    /// Endpoints relevant to the operator's goal.
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

impl ApiDescription {
    /// Create a description from its parts.
    #[must_use]
    pub fn new(title: impl Into<String>, base_url: impl Into<String>, endpoints: Vec<Endpoint>) -> Self {
        Self {
            title: title.into(),
            base_url: base_url.into(),
            endpoints,
        }
    }
}

/// Which stage follows extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// At least one endpoint needs a credential: prompt the operator first.
    Credential,
    /// Go straight to code generation.
    #[default]
    CodeGen,
}

impl Route {
    /// Stable identifier (`"credential"` or `"code_gen"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credential => "credential",
            Self::CodeGen => "code_gen",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language of the generated client library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetLanguage {
    /// Python module using `requests`.
    #[default]
    Python,
    /// TypeScript module.
    TypeScript,
    /// JavaScript (ES module).
    JavaScript,
    /// Rust module.
    Rust,
    /// Go package.
    Go,
}

impl TargetLanguage {
    /// All supported languages.
    pub const ALL: [Self; 5] = [
        Self::Python,
        Self::TypeScript,
        Self::JavaScript,
        Self::Rust,
        Self::Go,
    ];

    /// Lowercase identifier, also the token models tend to put after a code fence.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::TypeScript => "typescript",
            Self::JavaScript => "javascript",
            Self::Rust => "rust",
            Self::Go => "go",
        }
    }

    /// Human-readable name used in prompts.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Python => "Python",
            Self::TypeScript => "TypeScript",
            Self::JavaScript => "JavaScript",
            Self::Rust => "Rust",
            Self::Go => "Go",
        }
    }

    /// Source-file extension without the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Python => "py",
            Self::TypeScript => "ts",
            Self::JavaScript => "js",
            Self::Rust => "rs",
            Self::Go => "go",
        }
    }

    /// Tokens that identify this language after a fence or on a stray line.
    #[must_use]
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Python => &["python", "py", "python3"],
            Self::TypeScript => &["typescript", "ts"],
            Self::JavaScript => &["javascript", "js"],
            Self::Rust => &["rust", "rs"],
            Self::Go => &["go", "golang"],
        }
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TargetLanguage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.aliases().contains(&needle.as_str()))
            .ok_or_else(|| {
                Error::Config(format!(
                    "unsupported language '{s}' (expected one of: python, typescript, javascript, rust, go)"
                ))
            })
    }
}
