//! One-hot encoding and column alignment.
//!
//! The same helpers prepare training frames and single-row request frames, so
//! both sides agree on indicator column names (`<column>_<value>`).

use polars::prelude::*;

use crate::error::{PredictorError, Result};

/// Replace each categorical column with one indicator column per distinct value.
///
/// Untouched columns keep their order and come first; indicators follow,
/// grouped by source column and sorted by value. Null categories produce no
/// indicator.
pub fn get_dummies(df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
    let mut out: Vec<Series> = df
        .get_columns()
        .iter()
        .filter(|s| !columns.contains(&s.name()))
        .cloned()
        .collect();

    for name in columns {
        let values = df.column(name)?.cast(&DataType::Utf8)?;
        let values = values.utf8()?;

        let mut categories: Vec<&str> = values.into_iter().flatten().collect();
        categories.sort_unstable();
        categories.dedup();

        for category in categories {
            let indicator: Vec<i32> = values
                .into_iter()
                .map(|v| i32::from(v == Some(category)))
                .collect();
            out.push(Series::new(&format!("{name}_{category}"), indicator));
        }
    }

    Ok(DataFrame::new(out)?)
}

/// Align `df` to exactly `columns`, in that order, as `f32`.
///
/// Columns missing from `df` are filled with zero; columns of `df` not named
/// in `columns` are dropped.
pub fn reindex<S: AsRef<str>>(df: &DataFrame, columns: &[S]) -> Result<DataFrame> {
    let height = df.height();
    let aligned = columns
        .iter()
        .map(|name| {
            let name = name.as_ref();
            match df.column(name) {
                Ok(series) => series.cast(&DataType::Float32),
                Err(_) => Ok(Series::new(name, vec![0f32; height])),
            }
        })
        .collect::<PolarsResult<Vec<_>>>()?;
    Ok(DataFrame::new(aligned)?)
}

/// Flatten a numeric frame into row-major `f32` values.
pub fn to_row_major(df: &DataFrame) -> Result<Vec<f32>> {
    let array = df.to_ndarray::<Float32Type>(IndexOrder::C)?;
    let values = array
        .as_slice()
        .ok_or_else(|| PredictorError::Model("feature matrix is not contiguous".into()))?;
    Ok(values.to_vec())
}
