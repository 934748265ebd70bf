use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::sanitize::file_stem_for;
use crate::types::TargetLanguage;
use crate::{Error, Result};

/// Writes generated client source into an output directory.
///
/// The file is named after the sanitized API title with the target language's
/// extension. An existing file with the same name is overwritten.
#[derive(Debug, Clone)]
pub struct SourceWriter {
    dir: PathBuf,
    language: TargetLanguage,
}

impl SourceWriter {
    /// Create a writer for `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, language: TargetLanguage) -> Self {
        Self {
            dir: dir.into(),
            language,
        }
    }

    /// Output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Target language, which fixes the file extension.
    #[must_use]
    pub const fn language(&self) -> TargetLanguage {
        self.language
    }

    /// Path `title` would be written to.
    #[must_use]
    pub fn path_for(&self, title: &str) -> PathBuf {
        let file_name = format!("{}.{}", file_stem_for(title), self.language.extension());
        self.dir.join(file_name)
    }

    /// Write `code` for the API titled `title`, returning the path written.
    ///
    /// Creates the output directory when missing. Failures are reported as
    /// [`Error::Persistence`].
    pub fn write(&self, title: &str, code: &str) -> Result<PathBuf> {
        let path = self.path_for(title);

        fs::create_dir_all(&self.dir).map_err(|source| Error::Persistence {
            path: self.dir.clone(),
            source,
        })?;
        fs::write(&path, code).map_err(|source| Error::Persistence {
            path: path.clone(),
            source,
        })?;

        info!("Wrote {} bytes to {}", code.len(), path.display());
        Ok(path)
    }
}
