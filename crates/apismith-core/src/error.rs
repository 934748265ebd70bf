//! Error types and handling for apismith-core operations.
//!
//! Every pipeline stage reports failures through the single [`Error`] type so
//! the orchestrator can abort a run uniformly. Errors are categorized for
//! logging and carry a recoverability hint for callers that want to offer a
//! retry to the operator.
//!
//! ## Error Categories
//!
//! - **Fetch**: the documentation page could not be retrieved
//! - **Extraction**: the model did not produce a usable API description
//! - **Collection**: the operator aborted the credential prompt
//! - **Generation**: the model did not produce client source code
//! - **Persistence**: the generated file could not be written
//! - **Ambient**: I/O, network, configuration, serialization, timeouts
//!
//! ```rust
//! use apismith_core::Error;
//!
//! let err = Error::Extraction("missing field `title`".to_string());
//! assert_eq!(err.category(), "extraction");
//! assert!(!err.is_recoverable());
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for apismith-core operations.
///
/// `Display` gives an operator-facing message; `Debug` and `source()` keep the
/// full chain for diagnostics.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed outside of the persistence stage.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level HTTP failure.
    ///
    /// The underlying `reqwest::Error` is preserved so timeouts and connection
    /// failures can be told apart.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The content fetcher could not retrieve or render the page.
    #[error("Failed to fetch '{url}': {reason}")]
    Fetch {
        /// URL that was requested.
        url: String,
        /// Reason for the failure.
        reason: String,
    },

    /// The metadata extractor could not produce a conforming API description.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// The credential prompt was aborted by the operator.
    #[error("Credential collection aborted: {0}")]
    Collection(String),

    /// The code generator could not produce output.
    #[error("Generation error: {0}")]
    Generation(String),

    /// Writing the generated source file failed.
    #[error("Failed to write '{}': {source}", path.display())]
    Persistence {
        /// Target path of the write.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// URL is malformed or uses an unsupported scheme.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation exceeded its time limit.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Uncategorized failure, including internal invariant violations.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Check if the error might succeed when the operator starts a new run.
    ///
    /// The pipeline itself never retries; this is a hint for the operator
    /// loop's error message.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout(_) | Self::Fetch { .. } => true,
            Self::Io(e) | Self::Persistence { source: e, .. } => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a stable string identifier.
    ///
    /// Used as a structured field in log events and by the CLI to pick an exit
    /// code.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::Fetch { .. } => "fetch",
            Self::Extraction(_) => "extraction",
            Self::Collection(_) => "collection",
            Self::Generation(_) => "generation",
            Self::Persistence { .. } => "persistence",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Config(_) => "config",
            Self::Timeout(_) => "timeout",
            Self::Serialization(_) => "serialization",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn test_error_display_formatting() {
        let fetch = Error::Fetch {
            url: "https://example.com/docs".to_string(),
            reason: "HTTP 404".to_string(),
        };
        assert_eq!(
            fetch.to_string(),
            "Failed to fetch 'https://example.com/docs': HTTP 404"
        );

        let extraction = Error::Extraction("no title".to_string());
        assert!(extraction.to_string().contains("Extraction error"));

        let other = Error::Other("plain".to_string());
        assert_eq!(other.to_string(), "plain");
    }

    #[test]
    fn test_persistence_error_keeps_source() {
        let err = Error::Persistence {
            path: PathBuf::from("out/Pets API.py"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };

        assert!(err.to_string().contains("out/Pets API.py"));
        assert!(err.source().is_some());
        assert_eq!(err.category(), "persistence");
    }

    #[test]
    fn test_error_categories() {
        let cases = vec![
            (Error::Extraction(String::new()), "extraction"),
            (Error::Generation(String::new()), "generation"),
            (Error::Collection(String::new()), "collection"),
            (Error::Config(String::new()), "config"),
            (Error::Timeout(String::new()), "timeout"),
            (Error::InvalidUrl(String::new()), "invalid_url"),
            (Error::Serialization(String::new()), "serialization"),
            (Error::Other(String::new()), "other"),
        ];

        for (error, expected) in cases {
            assert_eq!(error.category(), expected);
        }
    }

    #[test]
    fn test_recoverability() {
        assert!(Error::Timeout("slow".into()).is_recoverable());
        assert!(
            Error::Fetch {
                url: "https://example.com".into(),
                reason: "reset".into(),
            }
            .is_recoverable()
        );
        assert!(Error::Io(io::Error::new(io::ErrorKind::Interrupted, "x")).is_recoverable());

        assert!(!Error::Extraction("bad json".into()).is_recoverable());
        assert!(!Error::Config("bad".into()).is_recoverable());
        assert!(
            !Error::Persistence {
                path: PathBuf::from("a.py"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            }
            .is_recoverable()
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_from_io_error() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        match err {
            Error::Io(inner) => assert_eq!(inner.kind(), io::ErrorKind::NotFound),
            other => panic!("expected Io variant, got {other:?}"),
        }
    }
}
