//! # apismith-core
//!
//! Core pipeline for apismith: read a developer-documentation page, extract the
//! API it describes with a language model, optionally collect a credential, and
//! write a generated client library to disk.
//!
//! ## Architecture
//!
//! - **Pipeline**: the state record, its stage machine, the branch rule and the
//!   orchestrator that drives one run ([`pipeline`])
//! - **Stages**: HTTP page fetching ([`fetcher`], [`html`]), model-backed
//!   extraction and generation ([`llm`]), file output ([`writer`])
//! - **Sanitization**: title normalization and generated-code cleanup ([`sanitize`])
//! - **Configuration**: TOML settings with environment overrides ([`config`])
//!
//! ## Quick Start
//!
//! ```rust
//! use apismith_core::pipeline::select_route;
//! use apismith_core::sanitize::{clean_generated_code, sanitize_title};
//! use apismith_core::{ApiDescription, Endpoint, Route, TargetLanguage};
//!
//! let api = ApiDescription::new(
//!     sanitize_title("Café API"),
//!     "https://api.example.com",
//!     vec![Endpoint::new("POST", "/orders").with_requires_api_key(true)],
//! );
//! assert_eq!(api.title, "Cafe API");
//! assert_eq!(select_route(&api), Route::Credential);
//!
//! let code = clean_generated_code("```python\nimport requests\n```", TargetLanguage::Python);
//! assert_eq!(code, "import requests\n");
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`]. [`Error::category`] gives a
//! stable identifier per failure class:
//!
//! ```rust
//! use apismith_core::Error;
//!
//! let err = Error::Extraction("model answer is not valid JSON".into());
//! assert_eq!(err.category(), "extraction");
//! assert!(!err.is_recoverable());
//! ```

/// Configuration loading and environment overrides
pub mod config;
/// Error types and result aliases
pub mod error;
/// HTTP retrieval of documentation pages
pub mod fetcher;
/// HTML to plain-text reduction
pub mod html;
/// Language-model client and model-backed stages
pub mod llm;
/// State machine, branch rule and orchestrator
pub mod pipeline;
/// Title sanitization and generated-code cleanup
pub mod sanitize;
/// Core data types
pub mod types;
/// Generated source persistence
pub mod writer;

pub use config::{Config, FetchConfig, LlmConfig, OutputConfig};
pub use error::{Error, Result};
pub use fetcher::HttpFetcher;
pub use pipeline::{Pipeline, PipelineFailure, PipelineState, Stage};
pub use types::*;
pub use writer::SourceWriter;
