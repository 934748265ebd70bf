//! CLI error handling with semantic exit codes.
//!
//! | Code | Category | Description |
//! |------|----------|-------------|
//! | 0 | Success | Run completed and the client was written |
//! | 1 | `Internal` | Unexpected/internal error |
//! | 2 | `Usage` | Invalid arguments, configuration or missing model key |
//! | 5 | `Network` | Documentation page or model endpoint unreachable |
//! | 6 | `Timeout` | Page fetch or model call timed out |
//! | 8 | `Model` | Extraction, generation or credential prompt failed |
//! | 9 | `Persistence` | Generated client could not be written |
//!
//! ```bash
//! apismith run --url "$DOCS" --task "list users"
//! case $? in
//!     0) echo "client written" ;;
//!     5) echo "check the documentation link" ;;
//!     *) echo "other failure" ;;
//! esac
//! ```

use std::fmt;
use std::process::ExitCode;

use apismith_core::{Error as CoreError, PipelineFailure};

/// Semantic error category determining the exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Unexpected or internal error (exit code 1).
    Internal = 1,

    /// Invalid arguments or configuration (exit code 2).
    Usage = 2,

    /// Network or fetch failure (exit code 5).
    Network = 5,

    /// Operation timed out (exit code 6).
    Timeout = 6,

    /// The language model could not produce usable output, or the operator
    /// aborted the credential prompt (exit code 8).
    Model = 8,

    /// Writing the generated client failed (exit code 9).
    Persistence = 9,
}

impl ErrorCategory {
    /// Get the exit code for this category.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        self as u8
    }

    /// Create an `ExitCode` from this category.
    #[must_use]
    pub fn as_exit_code(self) -> ExitCode {
        ExitCode::from(self.exit_code())
    }

    /// Get a short description of this error category.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Internal => "internal error",
            Self::Usage => "usage error",
            Self::Network => "network error",
            Self::Timeout => "timeout",
            Self::Model => "model error",
            Self::Persistence => "write error",
        }
    }

    /// Map a core error onto its exit category.
    #[must_use]
    pub const fn from_core(err: &CoreError) -> Self {
        match err {
            CoreError::Network(_) | CoreError::Fetch { .. } | CoreError::InvalidUrl(_) => {
                Self::Network
            },
            CoreError::Timeout(_) => Self::Timeout,
            CoreError::Extraction(_) | CoreError::Generation(_) | CoreError::Collection(_) => {
                Self::Model
            },
            CoreError::Persistence { .. } => Self::Persistence,
            CoreError::Config(_) => Self::Usage,
            CoreError::Io(_) | CoreError::Serialization(_) | CoreError::Other(_) => Self::Internal,
        }
    }

    /// Infer the error category from an error message.
    ///
    /// Fallback for errors that never passed through the core library.
    #[must_use]
    pub fn infer_from_message(msg: &str) -> Self {
        let msg_lower = msg.to_lowercase();

        // Before Network so "connection timeout" lands here
        if msg_lower.contains("timeout") || msg_lower.contains("timed out") {
            return Self::Timeout;
        }

        if msg_lower.contains("network")
            || msg_lower.contains("connection")
            || msg_lower.contains("dns")
            || msg_lower.contains("http")
            || msg_lower.contains("fetch")
        {
            return Self::Network;
        }

        if msg_lower.contains("model") || msg_lower.contains("extraction") {
            return Self::Model;
        }

        if msg_lower.contains("invalid argument")
            || msg_lower.contains("invalid value")
            || msg_lower.contains("configuration")
        {
            return Self::Usage;
        }

        Self::Internal
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A CLI error with a semantic category for exit code mapping.
#[derive(Debug)]
pub struct CliError {
    /// The semantic category of this error.
    pub category: ErrorCategory,
    /// The underlying error with full context.
    pub source: anyhow::Error,
}

impl CliError {
    /// Create a new CLI error with explicit category.
    pub fn new(category: ErrorCategory, source: impl Into<anyhow::Error>) -> Self {
        Self {
            category,
            source: source.into(),
        }
    }

    /// Create a usage error.
    pub fn usage(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::Usage, source)
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.category.exit_code()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

// Display already renders the wrapped error, so the chain continues below it
impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.source()
    }
}

/// Determine the exit code from an `anyhow::Error`.
///
/// Explicit [`CliError`] categories win, then the first core error found in
/// the chain, then message inference.
#[must_use]
pub fn exit_code_from_error(err: &anyhow::Error) -> u8 {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return cli_err.exit_code();
    }

    for cause in err.chain() {
        if let Some(failure) = cause.downcast_ref::<PipelineFailure>() {
            return ErrorCategory::from_core(&failure.error).exit_code();
        }
        if let Some(core) = cause.downcast_ref::<CoreError>() {
            return ErrorCategory::from_core(core).exit_code();
        }
    }

    ErrorCategory::infer_from_message(&err.to_string()).exit_code()
}
