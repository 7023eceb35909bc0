use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("Translator >= {0} is required to build from a source checkout")]
    ToolchainUnavailable(String),

    #[error("Unexpected extension of {}", .0.display())]
    InvalidInput(PathBuf),

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Template error in {}: {message}", .path.display())]
    Template { path: PathBuf, message: String },

    #[error("Translation of {} failed: {status}", .path.display())]
    TranslationFailed { path: PathBuf, status: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PrepareError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
