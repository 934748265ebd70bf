//! Configuration management for apismith.
//!
//! Configuration is stored in TOML and layered:
//!
//! 1. **Defaults**: built into [`Config::default`]
//! 2. **Config file**: `<config dir>/config.toml`
//! 3. **Environment variables**: `APISMITH_*` overrides
//!
//! The config directory is `APISMITH_CONFIG_DIR` when set, otherwise
//! `$XDG_CONFIG_HOME/apismith`, otherwise the platform config directory.
//!
//! ## Example Configuration File
//!
//! ```toml
//! [llm]
//! base_url = "https://generativelanguage.googleapis.com"
//! model = "gemini-2.5-flash"
//! api_key_env = ["GEMINI_API_KEY", "GOOGLE_API_KEY"]
//! timeout_secs = 120
//!
//! [fetch]
//! timeout_secs = 30
//!
//! [output]
//! dir = "clients"
//! language = "python"
//! echo_code = false
//! ```
//!
//! ```rust
//! use apismith_core::Config;
//!
//! let config: Config = toml::from_str("[output]\nlanguage = \"typescript\"\n")?;
//! assert_eq!(config.output.language.extension(), "ts");
//! assert_eq!(config.llm.model, "gemini-2.5-flash");
//! # Ok::<(), toml::de::Error>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::TargetLanguage;
use crate::{Error, Result};

/// Environment variable naming the configuration directory.
pub const CONFIG_DIR_ENV: &str = "APISMITH_CONFIG_DIR";
/// Environment override for [`LlmConfig::base_url`].
pub const LLM_BASE_URL_ENV: &str = "APISMITH_LLM_BASE_URL";
/// Environment override for [`LlmConfig::model`].
pub const MODEL_ENV: &str = "APISMITH_MODEL";
/// Environment override for [`OutputConfig::dir`].
pub const OUTPUT_DIR_ENV: &str = "APISMITH_OUTPUT_DIR";
/// Environment override for [`OutputConfig::language`].
pub const LANGUAGE_ENV: &str = "APISMITH_LANGUAGE";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Language-model client settings.
    pub llm: LlmConfig,
    /// Documentation fetching settings.
    pub fetch: FetchConfig,
    /// Generated file settings.
    pub output: OutputConfig,
}

/// Language-model client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API root of the Gemini-compatible endpoint.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Environment variables checked, in order, for the model API key.
    pub api_key_env: Vec<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Sampling temperature; provider default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Documentation fetching settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// User agent sent with page requests.
    pub user_agent: String,
}

/// Generated file settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory generated clients are written to.
    pub dir: PathBuf,
    /// Language of the generated client.
    pub language: TargetLanguage,
    /// Print generated code after each run.
    pub echo_code: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: vec!["GEMINI_API_KEY".to_string(), "GOOGLE_API_KEY".to_string()],
            timeout_secs: 120,
            temperature: None,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("apismith/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            language: TargetLanguage::default(),
            echo_code: false,
        }
    }
}

impl LlmConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Find the model API key in the configured environment variables.
    ///
    /// Empty values are skipped.
    pub fn resolve_api_key(&self) -> Result<String> {
        self.api_key_env
            .iter()
            .find_map(|name| {
                std::env::var(name)
                    .ok()
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty())
            })
            .ok_or_else(|| {
                Error::Config(format!(
                    "no model API key found; set one of: {}",
                    self.api_key_env.join(", ")
                ))
            })
    }
}

impl FetchConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from the default location, then apply environment
    /// overrides.
    ///
    /// A missing file yields the defaults; a file that exists but cannot be
    /// read or parsed is an error.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from an explicit file (no environment overrides).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config {}: {e}", path.display()))
        })
    }

    /// Save the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Failed to create config directory: {e}"))
            })?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
        fs::write(path, content).map_err(|e| Error::Config(format!("Failed to write config: {e}")))
    }

    /// Path of the configuration file, honoring `APISMITH_CONFIG_DIR`.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    fn config_dir() -> Result<PathBuf> {
        if let Some(dir) = non_empty_env(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        if let Some(xdg) = non_empty_env("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg).join("apismith"));
        }

        directories::ProjectDirs::from("dev", "apismith", "apismith")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| Error::Config("Failed to determine configuration directory".into()))
    }

    /// Apply `APISMITH_*` environment overrides in place.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(base_url) = non_empty_env(LLM_BASE_URL_ENV) {
            self.llm.base_url = base_url;
        }
        if let Some(model) = non_empty_env(MODEL_ENV) {
            self.llm.model = model;
        }
        if let Some(dir) = non_empty_env(OUTPUT_DIR_ENV) {
            self.output.dir = PathBuf::from(dir);
        }
        if let Some(language) = non_empty_env(LANGUAGE_ENV) {
            self.output.language = language.parse()?;
        }
        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.model, "gemini-2.5-flash");
        assert_eq!(config.llm.timeout(), Duration::from_secs(120));
        assert_eq!(config.fetch.timeout(), Duration::from_secs(30));
        assert!(config.fetch.user_agent.starts_with("apismith/"));
        assert_eq!(config.output.dir, PathBuf::from("."));
        assert_eq!(config.output.language, TargetLanguage::Python);
        assert!(!config.output.echo_code);
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        // Given: a config file that only sets the output section
        let dir = TempDir::new()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "[output]\ndir = \"clients\"\nlanguage = \"rust\"\n")?;

        // When: loading it
        let config = Config::load_from(&path)?;

        // Then: unspecified sections fall back to defaults
        assert_eq!(config.output.dir, PathBuf::from("clients"));
        assert_eq!(config.output.language, TargetLanguage::Rust);
        assert_eq!(config.llm, LlmConfig::default());
        assert_eq!(config.fetch, FetchConfig::default());
        Ok(())
    }

    #[test]
    fn test_malformed_file_is_config_error() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "[llm\nmodel = ")?;

        let err = Config::load_from(&path).unwrap_err();
        assert_eq!(err.category(), "config");
        Ok(())
    }

    #[test]
    fn test_unknown_language_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str("[output]\nlanguage = \"cobol\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_reload() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.llm.model = "gemini-2.5-pro".to_string();
        config.llm.temperature = Some(0.5);
        config.output.echo_code = true;
        config.save_to(&path)?;

        let reloaded = Config::load_from(&path)?;
        assert_eq!(reloaded, config);
        Ok(())
    }

    #[test]
    fn test_resolve_api_key_reports_candidates() {
        let llm = LlmConfig {
            api_key_env: vec!["APISMITH_TEST_KEY_THAT_IS_NEVER_SET".to_string()],
            ..LlmConfig::default()
        };

        let err = llm.resolve_api_key().unwrap_err();
        assert!(err.to_string().contains("APISMITH_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    proptest! {
        #[test]
        fn test_timeouts_roundtrip(llm_secs in 1u64..=3600, fetch_secs in 1u64..=600) {
            let mut config = Config::default();
            config.llm.timeout_secs = llm_secs;
            config.fetch.timeout_secs = fetch_secs;

            let serialized = toml::to_string_pretty(&config).unwrap();
            let deserialized: Config = toml::from_str(&serialized).unwrap();

            prop_assert_eq!(deserialized.llm.timeout(), Duration::from_secs(llm_secs));
            prop_assert_eq!(deserialized.fetch.timeout(), Duration::from_secs(fetch_secs));
        }
    }
}
