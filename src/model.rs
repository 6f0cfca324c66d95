//! The regression model seam: rows of features in, one value per row out.

use std::path::Path;
use std::sync::mpsc;
use std::thread;

use tracing::{debug, warn};
use xgboost::{Booster, DMatrix};

use crate::error::{PredictorError, Result};

/// Row-major feature matrix handed to a [`Regressor`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRows {
    data: Vec<f32>,
    num_rows: usize,
    num_cols: usize,
}

impl FeatureRows {
    pub fn new(data: Vec<f32>, num_cols: usize) -> Result<Self> {
        if num_cols == 0 || data.len() % num_cols != 0 {
            return Err(PredictorError::Model(format!(
                "{} values do not form rows of {num_cols} columns",
                data.len()
            )));
        }
        Ok(Self {
            num_rows: data.len() / num_cols,
            data,
            num_cols,
        })
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    pub fn row(&self, index: usize) -> Option<&[f32]> {
        self.data.chunks(self.num_cols).nth(index)
    }
}

/// A fitted regression estimator.
pub trait Regressor: Send + Sync {
    fn predict(&self, rows: &FeatureRows) -> Result<Vec<f32>>;
}

type Job = (FeatureRows, mpsc::Sender<Result<Vec<f32>>>);

/// XGBoost booster served from a dedicated thread.
///
/// The booster handle cannot cross threads, so it is loaded and used on its
/// own worker; `predict` sends the rows over and waits for the reply. The
/// worker stops once the regressor is dropped.
pub struct XgbRegressor {
    jobs: mpsc::Sender<Job>,
}

impl XgbRegressor {
    pub fn load(path: &Path) -> Result<Self> {
        let path = path.to_path_buf();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();
        let (jobs, job_rx) = mpsc::channel::<Job>();

        let spawn_path = path.clone();
        thread::Builder::new()
            .name("xgboost-predict".to_string())
            .spawn(move || {
                let booster = match Booster::load(&spawn_path) {
                    Ok(booster) => {
                        let _ = ready_tx.send(Ok(()));
                        booster
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(PredictorError::ArtifactFormat {
                            path: spawn_path,
                            reason: e.to_string(),
                        }));
                        return;
                    }
                };

                for (rows, reply) in job_rx {
                    if reply.send(predict_with(&booster, &rows)).is_err() {
                        warn!("prediction caller went away before the reply");
                    }
                }
                debug!("xgboost worker stopped");
            })
            .map_err(|source| PredictorError::ArtifactIo {
                path: path.clone(),
                source,
            })?;

        ready_rx
            .recv()
            .map_err(|_| PredictorError::Model("xgboost worker exited during load".into()))??;
        Ok(Self { jobs })
    }
}

fn predict_with(booster: &Booster, rows: &FeatureRows) -> Result<Vec<f32>> {
    let matrix = DMatrix::from_dense(rows.data(), rows.num_rows())
        .map_err(|e| PredictorError::Model(e.to_string()))?;
    booster
        .predict(&matrix)
        .map_err(|e| PredictorError::Model(e.to_string()))
}

impl Regressor for XgbRegressor {
    fn predict(&self, rows: &FeatureRows) -> Result<Vec<f32>> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.jobs
            .send((rows.clone(), reply_tx))
            .map_err(|_| PredictorError::Model("xgboost worker is not running".into()))?;
        reply_rx
            .recv()
            .map_err(|_| PredictorError::Model("xgboost worker dropped the request".into()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_rows_shape() {
        let rows = FeatureRows::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3).unwrap();
        assert_eq!(rows.num_rows(), 2);
        assert_eq!(rows.row(1), Some(&[4.0, 5.0, 6.0][..]));
        assert_eq!(rows.row(2), None);

        assert!(FeatureRows::new(vec![1.0, 2.0], 3).is_err());
        assert!(FeatureRows::new(vec![], 0).is_err());
    }
}
