use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::{Form, Json};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::error::WebError;
use super::page::{render, Outcome};
use super::AppState;
use crate::format::format_price;
use crate::record::{PropertyForm, PropertyRecord};

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub price: f64,
    pub formatted: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
}

fn default_record(state: &AppState) -> PropertyRecord {
    let form = &state.config.form;
    let city = form.cities.first().map(String::as_str).unwrap_or_default();
    PropertyRecord::from_defaults(&form.bounds, city)
}

#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let outcome = if state.predictor.is_some() {
        Outcome::Empty
    } else {
        Outcome::ModelMissing
    };
    Html(render(&state.config.form, &default_record(&state), &outcome))
}

#[instrument(skip_all)]
pub async fn predict_form(
    State(state): State<AppState>,
    form: Result<Form<PropertyForm>, FormRejection>,
) -> (StatusCode, Html<String>) {
    let fallback = default_record(&state);
    let parsed = form
        .map_err(|rejection| WebError::BadRequest(rejection.body_text()))
        .and_then(|Form(form)| PropertyRecord::try_from(form).map_err(WebError::from));
    let record = match parsed {
        Ok(record) => record,
        Err(err) => {
            warn!(error = %err, "form submission rejected");
            return (
                err.status(),
                Html(render(&state.config.form, &fallback, &Outcome::Error(err.to_string()))),
            );
        }
    };

    let (status, outcome) = match state.predict(record.clone()).await {
        Ok(prediction) => {
            let formatted = format_price(prediction.price, &state.config.form.currency_symbol);
            info!(city = %record.city, area = record.area, price = %formatted, "form prediction");
            (
                StatusCode::OK,
                Outcome::Price {
                    formatted,
                    street: record.street.clone(),
                },
            )
        }
        Err(WebError::ModelUnavailable) => {
            (StatusCode::SERVICE_UNAVAILABLE, Outcome::ModelMissing)
        }
        Err(e) => {
            warn!(error = %e, "form prediction failed");
            (e.status(), Outcome::Error(e.to_string()))
        }
    };

    (status, Html(render(&state.config.form, &record, &outcome)))
}

#[instrument(skip_all)]
pub async fn predict_json(
    State(state): State<AppState>,
    payload: Result<Json<PropertyRecord>, JsonRejection>,
) -> Result<Json<PredictResponse>, WebError> {
    let Json(record) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "api payload rejected");
        WebError::BadRequest(rejection.body_text())
    })?;
    let prediction = state.predict(record).await.map_err(|e| {
        warn!(error = %e, "api prediction failed");
        e
    })?;
    let formatted = format_price(prediction.price, &state.config.form.currency_symbol);
    info!(price = %formatted, "api prediction");

    Ok(Json(PredictResponse {
        price: prediction.price,
        formatted,
    }))
}

#[instrument(skip_all)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model_loaded: state.predictor.is_some(),
    })
}
