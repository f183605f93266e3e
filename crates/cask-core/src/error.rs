//! Domain-specific errors for cask operations

use cask_schema::{ManifestError, ValidationReport};
use thiserror::Error;

use crate::config::ConfigError;
use crate::io::download::DownloadError;
use crate::state::DbError;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error(transparent)]
    Invalid(#[from] ValidationReport),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State database error: {0}")]
    Db(#[from] DbError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0} is not installed")]
    NotInstalled(String),

    #[error("No manifest found for '{0}'")]
    UnknownCask(String),

    #[error("Unsupported artifact format: {0}")]
    UnsupportedFormat(String),

    #[error("{context}: {message}")]
    Context {
        context: &'static str,
        message: String,
    },

    #[error("{0}")]
    Other(String),
}

impl InstallError {
    /// Create an error with context for better debugging.
    pub fn context(ctx: &'static str, msg: impl std::fmt::Display) -> Self {
        Self::Context {
            context: ctx,
            message: msg.to_string(),
        }
    }
}

impl From<anyhow::Error> for InstallError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(format!("{err:#}"))
    }
}
