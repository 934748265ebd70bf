//! Pipeline state record and its stage machine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{ApiDescription, Query, Route};
use crate::{Error, Result};

/// Position of a run in the stage machine.
///
/// ```text
/// Init -> Extracted -> CredentialPending -> CredentialCollected -> CodeGenerated -> Persisted
///                  \________________________________________/^
/// any non-terminal stage -> Failed
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// State created, nothing run yet.
    #[default]
    Init,
    /// API description extracted and sanitized.
    Extracted,
    /// Branch rule selected credential collection.
    CredentialPending,
    /// Operator supplied a credential.
    CredentialCollected,
    /// Client source generated and cleaned.
    CodeGenerated,
    /// Source written to disk. Terminal.
    Persisted,
    /// A stage failed. Terminal.
    Failed,
}

impl Stage {
    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Persisted | Self::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Persisted | Self::Failed, _) => false,
            (_, Self::Failed)
            | (Self::Init, Self::Extracted)
            | (Self::Extracted, Self::CredentialPending | Self::CodeGenerated)
            | (Self::CredentialPending, Self::CredentialCollected)
            | (Self::CredentialCollected, Self::CodeGenerated)
            | (Self::CodeGenerated, Self::Persisted) => true,
            _ => false,
        }
    }

    /// Stable identifier used in logs and JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Extracted => "extracted",
            Self::CredentialPending => "credential_pending",
            Self::CredentialCollected => "credential_collected",
            Self::CodeGenerated => "code_generated",
            Self::Persisted => "persisted",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single record threaded through one pipeline run.
///
/// Fields are populated monotonically: each `record_*` method refuses to
/// overwrite a field a previous stage already set. The only in-place change
/// after extraction is the additive per-endpoint credential merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    query: Query,
    api_info: Option<ApiDescription>,
    code: String,
    file_name: String,
    route: Route,
    #[serde(skip_serializing)]
    credential: Option<String>,
    stage: Stage,
}

impl PipelineState {
    /// Fresh state for `query`, at [`Stage::Init`].
    #[must_use]
    pub fn new(query: Query) -> Self {
        Self {
            query,
            api_info: None,
            code: String::new(),
            file_name: String::new(),
            route: Route::default(),
            credential: None,
            stage: Stage::Init,
        }
    }

    /// The query the run was started with.
    #[must_use]
    pub const fn query(&self) -> &Query {
        &self.query
    }

    /// Extracted API description, once extraction completed.
    #[must_use]
    pub const fn api_info(&self) -> Option<&ApiDescription> {
        self.api_info.as_ref()
    }

    /// Generated source; empty until code generation completed.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Written file name; empty until persistence completed.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Branch selected after extraction.
    #[must_use]
    pub const fn route(&self) -> Route {
        self.route
    }

    /// Collected credential, if the credential stage ran.
    #[must_use]
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// Current stage.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    pub(crate) fn advance(&mut self, next: Stage) -> Result<()> {
        if !self.stage.can_transition_to(next) {
            return Err(Error::Other(format!(
                "illegal pipeline transition {} -> {next}",
                self.stage
            )));
        }
        tracing::debug!(from = %self.stage, to = %next, "Pipeline stage transition");
        self.stage = next;
        Ok(())
    }

    pub(crate) fn record_extraction(&mut self, api: ApiDescription, route: Route) -> Result<()> {
        if self.api_info.is_some() {
            return Err(overwrite("api_info"));
        }
        self.api_info = Some(api);
        self.route = route;
        self.advance(Stage::Extracted)
    }

    pub(crate) fn record_credential(&mut self, credential: String) -> Result<()> {
        if self.credential.is_some() {
            return Err(overwrite("credential"));
        }
        self.credential = Some(credential);
        self.advance(Stage::CredentialCollected)
    }

    pub(crate) fn record_code(&mut self, code: String) -> Result<()> {
        if !self.code.is_empty() {
            return Err(overwrite("code"));
        }
        self.code = code;
        self.advance(Stage::CodeGenerated)
    }

    pub(crate) fn record_file_name(&mut self, file_name: String) -> Result<()> {
        if !self.file_name.is_empty() {
            return Err(overwrite("file_name"));
        }
        self.file_name = file_name;
        self.advance(Stage::Persisted)
    }

    pub(crate) const fn api_info_mut(&mut self) -> Option<&mut ApiDescription> {
        self.api_info.as_mut()
    }

    pub(crate) fn fail(&mut self) {
        if !self.stage.is_terminal() {
            self.stage = Stage::Failed;
        }
    }
}

fn overwrite(field: &str) -> Error {
    Error::Other(format!("pipeline state field '{field}' is already populated"))
}
