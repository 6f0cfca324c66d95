//! Application configuration loaded from an optional TOML file.
//!
//! Every field has a default, so running without a file gives the same form
//! the original page shipped with: Rupee prices, nine Orange County cities and
//! the usual slider ranges.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PredictorError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Where the trained artifacts live
    pub artifacts: ArtifactsConfig,
    /// Form widgets and result formatting
    pub form: FormConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

/// Paths of the model and its trained column list.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// XGBoost booster saved by `train`
    pub model_path: PathBuf,
    /// JSON array with the column layout the model was trained on
    pub columns_path: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model.bin"),
            columns_path: PathBuf::from("model_columns.json"),
        }
    }
}

/// Bounds, step and initial value of a numeric widget.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Slider {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
}

impl Slider {
    const fn new(min: f64, max: f64, step: f64, default: f64) -> Self {
        Self {
            min,
            max,
            step,
            default,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn check(&self, name: &str) -> Result<()> {
        if self.min > self.max {
            return Err(PredictorError::Config(format!(
                "{name}: min {} exceeds max {}",
                self.min, self.max
            )));
        }
        if self.step <= 0.0 {
            return Err(PredictorError::Config(format!("{name}: step must be positive")));
        }
        if !self.contains(self.default) {
            return Err(PredictorError::Config(format!(
                "{name}: default {} outside {}..={}",
                self.default, self.min, self.max
            )));
        }
        Ok(())
    }

    /// Counts feed `u32` fields, so every bound must be a whole number >= 0.
    fn check_count(&self, name: &str) -> Result<()> {
        self.check(name)?;
        for (label, value) in [("min", self.min), ("max", self.max), ("default", self.default)] {
            if value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
                return Err(PredictorError::Config(format!(
                    "{name}: {label} {value} must be a whole non-negative number"
                )));
            }
        }
        Ok(())
    }
}

/// Numeric ranges accepted for each property attribute.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FormBounds {
    pub area: Slider,
    pub bedrooms: Slider,
    pub bathrooms: Slider,
    pub parking: Slider,
}

impl Default for FormBounds {
    fn default() -> Self {
        Self {
            area: Slider::new(500.0, 30000.0, 100.0, 2500.0),
            bedrooms: Slider::new(1.0, 10.0, 1.0, 4.0),
            bathrooms: Slider::new(1.0, 8.0, 1.0, 3.0),
            parking: Slider::new(0.0, 5.0, 1.0, 3.0),
        }
    }
}

/// Form widgets and result formatting.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub title: String,
    pub currency_symbol: String,
    /// Options of the city select, in display order
    pub cities: Vec<String>,
    #[serde(flatten)]
    pub bounds: FormBounds,
    /// Pause before answering, mirrors the spinner of the original page
    pub prediction_delay_ms: u64,
}

impl Default for FormConfig {
    fn default() -> Self {
        let cities = [
            "San Luis",
            "Yorba Linda",
            "Anaheim",
            "Fullerton",
            "Brea",
            "Newport Beach",
            "Irvine",
            "Santa Ana",
            "Costa Mesa",
        ];
        Self {
            title: "Real Estate Price Predictor".to_string(),
            currency_symbol: "₹".to_string(),
            cities: cities.iter().map(|c| c.to_string()).collect(),
            bounds: FormBounds::default(),
            prediction_delay_ms: 0,
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|e| {
            PredictorError::Config(format!("failed reading config file {}: {e}", path.display()))
        })?;
        let config = Self::from_toml(&raw).map_err(|e| match e {
            PredictorError::Config(msg) => {
                PredictorError::Config(format!("{}: {msg}", path.display()))
            }
            other => other,
        })?;
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| PredictorError::Config(format!("failed parsing TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let form = &self.form;
        if form.cities.is_empty() {
            return Err(PredictorError::Config("form.cities must not be empty".into()));
        }
        if form.cities.iter().any(|c| c.trim().is_empty()) {
            return Err(PredictorError::Config("form.cities contains a blank entry".into()));
        }
        if form.bounds.area.min <= 0.0 {
            return Err(PredictorError::Config("area.min must be positive".into()));
        }
        form.bounds.area.check("area")?;
        form.bounds.bedrooms.check_count("bedrooms")?;
        form.bounds.bathrooms.check_count("bathrooms")?;
        form.bounds.parking.check_count("parking")?;
        Ok(())
    }
}
