//! HTTP front end: the form page, a JSON endpoint and a health check.

mod error;
mod handlers;
mod page;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::error::PredictorError;
use crate::predictor::{Prediction, PricePredictor};
use crate::record::PropertyRecord;

pub use error::WebError;
pub use handlers::{HealthResponse, PredictResponse};

/// State shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// `None` when the artifacts could not be loaded at startup.
    pub predictor: Option<Arc<PricePredictor>>,
}

impl AppState {
    pub fn new(config: AppConfig, predictor: Option<PricePredictor>) -> Self {
        Self {
            config: Arc::new(config),
            predictor: predictor.map(Arc::new),
        }
    }

    /// Validate `record` and run the model off the async executor.
    #[instrument(skip_all, fields(city = %record.city, area = record.area))]
    pub async fn predict(&self, record: PropertyRecord) -> Result<Prediction, WebError> {
        let predictor = self.predictor.clone().ok_or(WebError::ModelUnavailable)?;
        record.validate(&self.config.form.bounds)?;

        let delay = self.config.form.prediction_delay_ms;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let prediction = tokio::task::spawn_blocking(move || predictor.predict(&record))
            .await
            .map_err(|e| PredictorError::Model(format!("prediction task failed: {e}")))??;
        Ok(prediction)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/predict", post(handlers::predict_form))
        .route("/api/predict", post(handlers::predict_json))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(state: AppState) -> Result<()> {
    let server = &state.config.server;
    let addr: SocketAddr = format!("{}:{}", server.host, server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", server.host, server.port))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, model_loaded = state.predictor.is_some(), "serving price predictor");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
