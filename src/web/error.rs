use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::error::PredictorError;

/// Failures surfaced to HTTP clients.
#[derive(Error, Debug)]
pub enum WebError {
    #[error("model files are not loaded; check the artifact paths and restart")]
    ModelUnavailable,

    /// The request body could not be decoded.
    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Predictor(#[from] PredictorError),
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Predictor(PredictorError::InvalidInput { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Predictor(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
