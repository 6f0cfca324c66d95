//! Training script that produces the model and column artifacts.
//!
//! Steps:
//! 1. Fetch the housing CSV (download when given a URL)
//! 2. Load it and normalize the yes/no flag columns
//! 3. Split into train and test sets
//! 4. One-hot encode `city` and split features from the `price` target
//! 5. Train an XGBoost regressor and score it on the test set
//! 6. Save the booster and the trained column list

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use polars::prelude::*;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::info;
use xgboost::{parameters, Booster, DMatrix};

use crate::artifacts::ModelColumns;
use crate::encode::{get_dummies, reindex, to_row_major};
use crate::predictor::CATEGORICAL_COLUMNS;

pub const TARGET_COLUMN: &str = "price";
pub const FLAG_COLUMNS: [&str; 2] = ["mainroad", "basement"];
pub const NUMERIC_COLUMNS: [&str; 4] = ["area", "bedrooms", "bathrooms", "parking"];
/// Collected by the form but never used as a feature.
pub const IGNORED_COLUMNS: [&str; 1] = ["street"];

/// Inputs of a training run.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Local CSV path or http(s) URL
    pub source: String,
    /// Where a downloaded CSV is written
    pub download_path: PathBuf,
    pub model_path: PathBuf,
    pub columns_path: PathBuf,
    /// Fraction of rows held out for scoring
    pub test_fraction: f64,
    pub boost_rounds: u32,
    pub seed: u64,
}

/// Regression scores on the held-out rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

pub fn fetch_dataset(source: &str, dest: &Path) -> anyhow::Result<PathBuf> {
    if !(source.starts_with("http://") || source.starts_with("https://")) {
        return Ok(PathBuf::from(source));
    }

    info!(url = source, "downloading CSV file");
    let response = reqwest::blocking::get(source)
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("failed to download {source}"))?;
    let bytes = response.bytes()?;
    std::fs::write(dest, &bytes).with_context(|| format!("failed to write {}", dest.display()))?;
    info!(path = %dest.display(), bytes = bytes.len(), "saved dataset");

    Ok(dest.to_path_buf())
}

pub fn load_csv_file(path: &Path) -> anyhow::Result<DataFrame> {
    let df = CsvReader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .has_header(true)
        .finish()?;

    info!(rows = df.height(), columns = df.width(), "loaded dataset");
    Ok(df)
}

fn parse_flag(raw: &str) -> anyhow::Result<i32> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" => Ok(1),
        "no" | "false" | "0" => Ok(0),
        other => bail!("unrecognised flag value {other:?}"),
    }
}

/// Map yes/no, true/false or 1/0 flag columns to 0/1 integers.
pub fn normalize_flags(df: &mut DataFrame, columns: &[&str]) -> anyhow::Result<()> {
    for name in columns {
        let series = df.column(name)?.clone();
        let encoded = match series.dtype() {
            DataType::Utf8 => {
                let flags = series
                    .utf8()?
                    .into_iter()
                    .map(|v| v.map(parse_flag).transpose())
                    .collect::<anyhow::Result<Vec<Option<i32>>>>()
                    .with_context(|| format!("column {name}"))?;
                Series::new(name, flags)
            }
            _ => series.cast(&DataType::Int32)?,
        };
        df.replace(name, encoded)?;
    }
    Ok(())
}

pub fn train_test_split(
    df: &DataFrame,
    test_fraction: f64,
    seed: u64,
) -> anyhow::Result<(DataFrame, DataFrame)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        bail!("test fraction must be between 0 and 1, got {test_fraction}");
    }

    if df.height() < 2 {
        bail!("need at least two rows to split, got {}", df.height());
    }

    let mut indices: Vec<u32> = (0..df.height() as u32).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_len = ((df.height() as f64) * test_fraction).round() as usize;
    let test_len = test_len.clamp(1, df.height() - 1);
    let (test_indices, train_indices) = indices.split_at(test_len);

    let train_df = df.take(&UInt32Chunked::from_vec("", train_indices.to_vec()))?;
    let test_df = df.take(&UInt32Chunked::from_vec("", test_indices.to_vec()))?;

    Ok((train_df, test_df))
}

/// One-hot encode, drop the ignored columns and split off the target.
pub fn prepare_features(df: &DataFrame) -> anyhow::Result<(DataFrame, Vec<f32>)> {
    let mut keep: Vec<&str> = NUMERIC_COLUMNS.to_vec();
    keep.extend(FLAG_COLUMNS);
    keep.extend(CATEGORICAL_COLUMNS);
    for name in &keep {
        if df.column(name).is_err() {
            bail!("dataset is missing column {name:?}");
        }
    }
    let unused: Vec<&str> = df
        .get_column_names()
        .into_iter()
        .filter(|c| !keep.contains(c) && *c != TARGET_COLUMN)
        .collect();
    if !unused.is_empty() {
        info!(?unused, ignored = ?IGNORED_COLUMNS, "dropping non-feature columns");
    }

    let features = get_dummies(&df.select(keep.clone())?, &CATEGORICAL_COLUMNS)?;
    let target = df
        .column(TARGET_COLUMN)
        .with_context(|| format!("dataset is missing target column {TARGET_COLUMN:?}"))?
        .cast(&DataType::Float32)?;
    let missing = target.null_count();
    if missing > 0 {
        bail!("target column {TARGET_COLUMN:?} has {missing} missing values");
    }
    let target: Vec<f32> = target.f32()?.into_no_null_iter().collect();

    Ok((features, target))
}

pub fn evaluate(predicted: &[f32], actual: &[f32]) -> Metrics {
    let n = actual.len().max(1) as f64;
    let mean = actual.iter().map(|&y| f64::from(y)).sum::<f64>() / n;

    let (mut sse, mut sae, mut sst) = (0.0, 0.0, 0.0);
    for (&p, &y) in predicted.iter().zip(actual) {
        let err = f64::from(p) - f64::from(y);
        sse += err * err;
        sae += err.abs();
        sst += (f64::from(y) - mean).powi(2);
    }

    Metrics {
        rmse: (sse / n).sqrt(),
        mae: sae / n,
        r2: if sst > 0.0 { 1.0 - sse / sst } else { 0.0 },
    }
}

/// Train on `x_train` and score on `x_test`, which is aligned to the
/// training columns first.
pub fn train_xgboost_model(
    x_train: &DataFrame,
    y_train: &[f32],
    x_test: &DataFrame,
    y_test: &[f32],
    boost_rounds: u32,
) -> anyhow::Result<(Booster, ModelColumns, Metrics)> {
    let columns = ModelColumns::new(
        x_train
            .get_column_names()
            .into_iter()
            .map(String::from)
            .collect(),
    )?;
    let x_train = reindex(x_train, columns.as_slice())?;
    let x_test = reindex(x_test, columns.as_slice())?;

    let mut dmatrix_train = DMatrix::from_dense(&to_row_major(&x_train)?, x_train.height())?;
    dmatrix_train.set_labels(y_train)?;
    let mut dmatrix_test = DMatrix::from_dense(&to_row_major(&x_test)?, x_test.height())?;
    dmatrix_test.set_labels(y_test)?;

    let evaluation_sets: &[(&DMatrix, &str)] = &[(&dmatrix_train, "train"), (&dmatrix_test, "test")];
    let training_params = parameters::TrainingParametersBuilder::default()
        .dtrain(&dmatrix_train)
        .boost_rounds(boost_rounds)
        .evaluation_sets(Some(evaluation_sets))
        .build()
        .map_err(anyhow::Error::msg)?;

    let model = Booster::train(&training_params)?;

    let predicted = model.predict(&dmatrix_test)?;
    let metrics = evaluate(&predicted, y_test);
    info!(
        rmse = metrics.rmse,
        mae = metrics.mae,
        r2 = metrics.r2,
        "test set scores"
    );

    Ok((model, columns, metrics))
}

/// Run the whole pipeline and write both artifacts.
pub fn run(options: &TrainOptions) -> anyhow::Result<Metrics> {
    info!("starting training run");

    let csv_path = fetch_dataset(&options.source, &options.download_path)?;
    let mut df = load_csv_file(&csv_path)?;
    normalize_flags(&mut df, &FLAG_COLUMNS)?;

    let (train_df, test_df) = train_test_split(&df, options.test_fraction, options.seed)?;
    info!(train = train_df.height(), test = test_df.height(), "split dataset");

    let (x_train, y_train) = prepare_features(&train_df)?;
    let (x_test, y_test) = prepare_features(&test_df)?;

    let (model, columns, metrics) =
        train_xgboost_model(&x_train, &y_train, &x_test, &y_test, options.boost_rounds)?;

    model
        .save(&options.model_path)
        .with_context(|| format!("failed to save {}", options.model_path.display()))?;
    columns.save(&options.columns_path)?;
    info!(
        model = %options.model_path.display(),
        columns = %options.columns_path.display(),
        "saved artifacts"
    );

    Ok(metrics)
}
