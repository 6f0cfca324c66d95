//! Estimate property prices from a handful of attributes.
//!
//! A request flows through the same steps whichever surface it arrives on:
//! build a [`PropertyRecord`], one-hot encode its city, align the columns to
//! the layout the model was trained on, run the model, format the price.

pub mod artifacts;
pub mod cli;
pub mod config;
pub mod encode;
pub mod error;
pub mod format;
pub mod model;
pub mod predictor;
pub mod record;
pub mod train;
pub mod web;

pub use artifacts::{ModelArtifacts, ModelColumns};
pub use config::AppConfig;
pub use error::{PredictorError, Result};
pub use format::format_price;
pub use model::{FeatureRows, Regressor, XgbRegressor};
pub use predictor::{Prediction, PricePredictor};
pub use record::{PropertyForm, PropertyRecord};
