//! The per-request property record and the raw form payload it is built from.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{FormBounds, Slider};
use crate::error::{PredictorError, Result};

/// Attributes of one property, as fed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    /// Floor area in square feet
    pub area: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    /// Whether the property faces a main road
    pub mainroad: bool,
    pub basement: bool,
    /// Number of parking spots
    pub parking: u32,
    pub city: String,
    /// Collected for display only; the model never sees it.
    #[serde(default)]
    pub street: Option<String>,
}

impl PropertyRecord {
    /// Record pre-filled with the configured widget defaults.
    pub fn from_defaults(bounds: &FormBounds, city: &str) -> Self {
        Self {
            area: bounds.area.default,
            bedrooms: bounds.bedrooms.default as u32,
            bathrooms: bounds.bathrooms.default as u32,
            mainroad: true,
            basement: false,
            parking: bounds.parking.default as u32,
            city: city.to_string(),
            street: None,
        }
    }

    /// Check every numeric field against its configured range.
    ///
    /// Cities outside the form's list are not rejected: they encode to a
    /// column the model has never seen and are dropped during alignment.
    pub fn validate(&self, bounds: &FormBounds) -> Result<()> {
        if !self.area.is_finite() || self.area <= 0.0 {
            return Err(PredictorError::invalid("area", "must be a positive number"));
        }
        check_range("area", self.area, &bounds.area)?;
        check_range("bedrooms", f64::from(self.bedrooms), &bounds.bedrooms)?;
        check_range("bathrooms", f64::from(self.bathrooms), &bounds.bathrooms)?;
        check_range("parking", f64::from(self.parking), &bounds.parking)?;
        if self.city.trim().is_empty() {
            return Err(PredictorError::invalid("city", "must not be empty"));
        }
        Ok(())
    }

    /// One-row frame in the shape the model was trained from, before encoding.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let df = DataFrame::new(vec![
            Series::new("area", &[self.area]),
            Series::new("bedrooms", &[i64::from(self.bedrooms)]),
            Series::new("bathrooms", &[i64::from(self.bathrooms)]),
            Series::new("mainroad", &[i32::from(self.mainroad)]),
            Series::new("basement", &[i32::from(self.basement)]),
            Series::new("parking", &[i64::from(self.parking)]),
            Series::new("city", &[self.city.trim()]),
        ])?;
        Ok(df)
    }
}

fn check_range(field: &'static str, value: f64, slider: &Slider) -> Result<()> {
    if slider.contains(value) {
        Ok(())
    } else {
        Err(PredictorError::invalid(
            field,
            format!("{value} is outside {}..={}", slider.min, slider.max),
        ))
    }
}

/// Raw urlencoded payload of the HTML form.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyForm {
    pub area: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub mainroad: String,
    pub basement: String,
    pub parking: u32,
    pub city: String,
    #[serde(default)]
    pub street: String,
}

fn parse_yes_no(field: &'static str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" => Ok(true),
        "no" => Ok(false),
        other => Err(PredictorError::invalid(
            field,
            format!("expected Yes or No, got {other:?}"),
        )),
    }
}

impl TryFrom<PropertyForm> for PropertyRecord {
    type Error = PredictorError;

    fn try_from(form: PropertyForm) -> Result<Self> {
        let street = form.street.trim();
        Ok(Self {
            area: form.area,
            bedrooms: form.bedrooms,
            bathrooms: form.bathrooms,
            mainroad: parse_yes_no("mainroad", &form.mainroad)?,
            basement: parse_yes_no("basement", &form.basement)?,
            parking: form.parking,
            city: form.city.trim().to_string(),
            street: (!street.is_empty()).then(|| street.to_string()),
        })
    }
}
