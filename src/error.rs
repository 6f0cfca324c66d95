//! Error types for the prediction pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading artifacts, assembling records or predicting.
#[derive(Error, Debug)]
pub enum PredictorError {
    /// A submitted field failed validation.
    #[error("invalid {field}: {reason}")]
    InvalidInput {
        /// Name of the offending field.
        field: &'static str,
        /// Human readable reason.
        reason: String,
    },

    /// An artifact file could not be read or written.
    #[error("artifact {path} unavailable: {source}")]
    ArtifactIo {
        /// Path of the artifact.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An artifact file was read but its contents are unusable.
    #[error("artifact {path} is malformed: {reason}")]
    ArtifactFormat {
        /// Path of the artifact.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// The regression model reported an error.
    #[error("model error: {0}")]
    Model(String),

    /// The regression model returned no values.
    #[error("model returned no prediction")]
    EmptyPrediction,

    /// Table manipulation failed.
    #[error(transparent)]
    Table(#[from] polars::prelude::PolarsError),

    /// Configuration is inconsistent.
    #[error("config error: {0}")]
    Config(String),
}

impl PredictorError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// True when the error means an artifact file does not exist.
    pub fn is_missing_artifact(&self) -> bool {
        matches!(
            self,
            Self::ArtifactIo { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, PredictorError>;
