use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use real_estate_price_predictor::cli::{Cli, Commands};
use real_estate_price_predictor::AppConfig;

// Entry point
// 1. Set up logging
// 2. Parse flags and load the config file
// 3. Serve the form, train a model, or predict once

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("real_estate_price_predictor=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    info!(config = ?cli.config, "configuration loaded");

    match cli.command {
        Commands::Serve(cmd) => cmd.run(config).await?,
        Commands::Train(cmd) => cmd.run(config).await?,
        Commands::Predict(cmd) => cmd.run(config).await?,
    }

    Ok(())
}
