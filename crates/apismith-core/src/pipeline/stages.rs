//! Capabilities the orchestrator drives.
//!
//! Each stage is a trait so runs can be tested with in-memory fakes and so the
//! CLI can plug in an interactive credential prompt.

use async_trait::async_trait;

use crate::Result;
use crate::types::ApiDescription;

/// Retrieves a documentation page as plain text.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch `url` and return its rendered text.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Turns page text plus a goal into structured API metadata.
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    /// Extract an API description from `page_text` relevant to `goal`.
    ///
    /// An absent goal is passed through as `None`.
    async fn extract(&self, page_text: &str, goal: Option<&str>) -> Result<ApiDescription>;
}

/// Obtains a credential from the operator.
///
/// Blocks until the operator answers. The returned string may be empty and is
/// not validated. The only failure is the operator aborting the prompt.
pub trait CredentialCollector: Send + Sync {
    /// Ask for a credential for `api_title`.
    fn collect(&self, api_title: &str) -> Result<String>;
}

/// Produces client source code from API metadata.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    /// Generate client source for `api`.
    async fn generate(&self, api: &ApiDescription) -> Result<String>;
}

/// Credential collector that always answers with a fixed value.
///
/// Used for non-interactive runs where the credential is supplied up front.
#[derive(Debug, Clone)]
pub struct StaticCredential(String);

impl StaticCredential {
    /// Wrap a fixed credential.
    #[must_use]
    pub fn new(credential: impl Into<String>) -> Self {
        Self(credential.into())
    }
}

impl CredentialCollector for StaticCredential {
    fn collect(&self, _api_title: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}
