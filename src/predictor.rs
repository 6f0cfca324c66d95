//! Record in, price out.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::artifacts::{ModelArtifacts, ModelColumns};
use crate::encode::{get_dummies, reindex, to_row_major};
use crate::error::{PredictorError, Result};
use crate::model::{FeatureRows, Regressor};
use crate::record::PropertyRecord;

/// Categorical inputs expanded into indicator columns.
pub const CATEGORICAL_COLUMNS: [&str; 1] = ["city"];

/// Estimated price for one property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub price: f64,
}

/// Runs the encode, align and predict steps against a loaded model.
#[derive(Clone)]
pub struct PricePredictor {
    regressor: Arc<dyn Regressor>,
    columns: ModelColumns,
}

impl PricePredictor {
    pub fn new(regressor: Arc<dyn Regressor>, columns: ModelColumns) -> Self {
        Self { regressor, columns }
    }

    pub fn columns(&self) -> &ModelColumns {
        &self.columns
    }

    /// Encode `record` into the trained column layout.
    pub fn features(&self, record: &PropertyRecord) -> Result<FeatureRows> {
        let frame = record.to_frame()?;
        let encoded = get_dummies(&frame, &CATEGORICAL_COLUMNS)?;
        let aligned = reindex(&encoded, self.columns.as_slice())?;
        FeatureRows::new(to_row_major(&aligned)?, self.columns.len())
    }

    pub fn predict(&self, record: &PropertyRecord) -> Result<Prediction> {
        let rows = self.features(record)?;
        debug!(features = ?rows.data(), "aligned request record");

        let output = self.regressor.predict(&rows)?;
        let price = output
            .first()
            .copied()
            .ok_or(PredictorError::EmptyPrediction)?;
        Ok(Prediction {
            price: f64::from(price),
        })
    }
}

impl From<ModelArtifacts> for PricePredictor {
    fn from(artifacts: ModelArtifacts) -> Self {
        Self::new(artifacts.regressor, artifacts.columns)
    }
}
