//! Loading and saving the trained artifacts.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::ArtifactsConfig;
use crate::error::{PredictorError, Result};
use crate::model::{Regressor, XgbRegressor};

/// Ordered column layout the model was trained against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelColumns(Vec<String>);

impl ModelColumns {
    pub fn new(columns: Vec<String>) -> Result<Self> {
        if columns.is_empty() {
            return Err(PredictorError::invalid("columns", "column list is empty"));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(PredictorError::invalid(
                "columns",
                format!("duplicate column {dup:?}"),
            ));
        }
        Ok(Self(columns))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read a JSON array of column names.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| PredictorError::ArtifactIo {
            path: path.to_path_buf(),
            source,
        })?;
        let columns: Vec<String> =
            serde_json::from_str(&raw).map_err(|e| PredictorError::ArtifactFormat {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Self::new(columns).map_err(|e| PredictorError::ArtifactFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.0).map_err(|e| {
            PredictorError::ArtifactFormat {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        std::fs::write(path, json).map_err(|source| PredictorError::ArtifactIo {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// The model and its column list, loaded once and shared read-only.
#[derive(Clone)]
pub struct ModelArtifacts {
    pub regressor: Arc<dyn Regressor>,
    pub columns: ModelColumns,
}

impl ModelArtifacts {
    pub fn load(config: &ArtifactsConfig) -> Result<Self> {
        ensure_exists(&config.model_path)?;
        ensure_exists(&config.columns_path)?;

        let columns = ModelColumns::load(&config.columns_path)?;
        let regressor = XgbRegressor::load(&config.model_path)?;
        info!(
            model = %config.model_path.display(),
            columns = columns.len(),
            "loaded model artifacts"
        );

        Ok(Self {
            regressor: Arc::new(regressor),
            columns,
        })
    }
}

fn ensure_exists(path: &Path) -> Result<()> {
    std::fs::metadata(path)
        .map(|_| ())
        .map_err(|source| PredictorError::ArtifactIo {
            path: path.to_path_buf(),
            source,
        })
}
