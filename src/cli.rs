//! Command-line interface: serve the form, train the model, or predict once.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use crate::artifacts::ModelArtifacts;
use crate::config::{AppConfig, ArtifactsConfig};
use crate::format::format_price;
use crate::predictor::PricePredictor;
use crate::record::PropertyRecord;
use crate::train::{self, TrainOptions};
use crate::web::{self, AppState};

#[derive(Parser, Debug)]
#[command(name = "real-estate-price-predictor", version, about)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, short = 'c', global = true, env = "PRICE_PREDICTOR_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the prediction form over HTTP
    Serve(ServeCommand),
    /// Train a model and write its artifacts
    Train(TrainCommand),
    /// Predict the price of a single property
    Predict(PredictCommand),
}

/// Overrides for the artifact locations.
#[derive(Args, Debug, Clone, Default)]
pub struct ArtifactArgs {
    /// Saved XGBoost model
    #[arg(long, env = "PRICE_PREDICTOR_MODEL")]
    pub model: Option<PathBuf>,

    /// JSON list of trained columns
    #[arg(long, env = "PRICE_PREDICTOR_COLUMNS")]
    pub columns: Option<PathBuf>,
}

impl ArtifactArgs {
    fn apply(&self, artifacts: &mut ArtifactsConfig) {
        if let Some(model) = &self.model {
            artifacts.model_path = model.clone();
        }
        if let Some(columns) = &self.columns {
            artifacts.columns_path = columns.clone();
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeCommand {
    /// Host address to bind to
    #[arg(long, env = "PRICE_PREDICTOR_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, short = 'p', env = "PRICE_PREDICTOR_PORT")]
    pub port: Option<u16>,

    #[command(flatten)]
    pub artifacts: ArtifactArgs,
}

impl ServeCommand {
    pub async fn run(&self, mut config: AppConfig) -> Result<()> {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        self.artifacts.apply(&mut config.artifacts);

        let artifacts = config.artifacts.clone();
        let loaded = tokio::task::spawn_blocking(move || ModelArtifacts::load(&artifacts))
            .await
            .context("artifact loader panicked")?;
        let predictor = match loaded {
            Ok(artifacts) => Some(PricePredictor::from(artifacts)),
            Err(e) if e.is_missing_artifact() => {
                warn!(error = %e, "model files not found, serving without predictions");
                None
            }
            Err(e) => return Err(e).context("failed to load model artifacts"),
        };

        web::serve(AppState::new(config, predictor)).await
    }
}

#[derive(Args, Debug, Clone)]
pub struct TrainCommand {
    /// Housing CSV path or http(s) URL
    #[arg(long, short = 'd')]
    pub data: String,

    /// Where a downloaded CSV is stored
    #[arg(long, default_value = "housing.csv")]
    pub download_to: PathBuf,

    /// Fraction of rows held out for scoring
    #[arg(long, default_value = "0.2")]
    pub test_fraction: f64,

    /// Number of boosting rounds
    #[arg(long, default_value = "100")]
    pub rounds: u32,

    /// Seed for the train/test shuffle
    #[arg(long, default_value = "42")]
    pub seed: u64,

    #[command(flatten)]
    pub artifacts: ArtifactArgs,
}

impl TrainCommand {
    pub async fn run(&self, mut config: AppConfig) -> Result<()> {
        self.artifacts.apply(&mut config.artifacts);
        let options = TrainOptions {
            source: self.data.clone(),
            download_path: self.download_to.clone(),
            model_path: config.artifacts.model_path,
            columns_path: config.artifacts.columns_path,
            test_fraction: self.test_fraction,
            boost_rounds: self.rounds,
            seed: self.seed,
        };

        let metrics = tokio::task::spawn_blocking(move || train::run(&options))
            .await
            .context("training task panicked")??;
        info!(rmse = metrics.rmse, mae = metrics.mae, r2 = metrics.r2, "training finished");
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub struct PredictCommand {
    /// Area in square feet
    #[arg(long)]
    pub area: f64,

    #[arg(long)]
    pub bedrooms: u32,

    #[arg(long)]
    pub bathrooms: u32,

    /// Property faces a main road
    #[arg(long)]
    pub mainroad: bool,

    #[arg(long)]
    pub basement: bool,

    #[arg(long, default_value = "0")]
    pub parking: u32,

    #[arg(long)]
    pub city: String,

    #[arg(long)]
    pub street: Option<String>,

    #[command(flatten)]
    pub artifacts: ArtifactArgs,
}

impl PredictCommand {
    pub fn record(&self) -> PropertyRecord {
        PropertyRecord {
            area: self.area,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            mainroad: self.mainroad,
            basement: self.basement,
            parking: self.parking,
            city: self.city.clone(),
            street: self.street.clone(),
        }
    }

    pub async fn run(&self, mut config: AppConfig) -> Result<()> {
        self.artifacts.apply(&mut config.artifacts);
        let record = self.record();
        record.validate(&config.form.bounds)?;

        let artifacts = config.artifacts.clone();
        let prediction = tokio::task::spawn_blocking(move || {
            let predictor = PricePredictor::from(ModelArtifacts::load(&artifacts)?);
            predictor.predict(&record)
        })
        .await
        .context("prediction task panicked")??;

        println!("{}", format_price(prediction.price, &config.form.currency_symbol));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_overrides() {
        let cli = Cli::try_parse_from([
            "real-estate-price-predictor",
            "serve",
            "--port",
            "9000",
            "--model",
            "/tmp/m.bin",
        ])
        .unwrap();
        let Commands::Serve(cmd) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(cmd.port, Some(9000));

        let mut artifacts = ArtifactsConfig::default();
        cmd.artifacts.apply(&mut artifacts);
        assert_eq!(artifacts.model_path, PathBuf::from("/tmp/m.bin"));
        assert_eq!(artifacts.columns_path, PathBuf::from("model_columns.json"));
    }

    #[test]
    fn predict_flags_build_a_record() {
        let cli = Cli::try_parse_from([
            "real-estate-price-predictor",
            "predict",
            "--area",
            "2500",
            "--bedrooms",
            "4",
            "--bathrooms",
            "3",
            "--mainroad",
            "--parking",
            "2",
            "--city",
            "Irvine",
        ])
        .unwrap();
        let Commands::Predict(cmd) = cli.command else {
            panic!("expected predict");
        };
        let record = cmd.record();
        assert!(record.mainroad);
        assert!(!record.basement);
        assert_eq!(record.parking, 2);
        assert_eq!(record.street, None);
    }
}
