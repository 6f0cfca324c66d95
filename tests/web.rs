use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use tracing::span::{Attributes, Id};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

use real_estate_price_predictor::web::{router, AppState};
use real_estate_price_predictor::{
    AppConfig, FeatureRows, ModelColumns, PricePredictor, Regressor, Result,
};

/// Price = 1000 per sqft plus a flat premium for Irvine.
struct PerSquareFoot;

impl Regressor for PerSquareFoot {
    fn predict(&self, rows: &FeatureRows) -> Result<Vec<f32>> {
        Ok((0..rows.num_rows())
            .filter_map(|i| rows.row(i))
            .map(|row| row[0] * 1000.0 + row[2] * 250_000.0)
            .collect())
    }
}

fn state(with_model: bool) -> AppState {
    let predictor = with_model.then(|| {
        let columns = ModelColumns::new(vec![
            "area".to_string(),
            "city_Brea".to_string(),
            "city_Irvine".to_string(),
        ])
        .unwrap();
        PricePredictor::new(Arc::new(PerSquareFoot), columns)
    });
    AppState::new(AppConfig::default(), predictor)
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn json_request(body: Value) -> Request<Body> {
    Request::post("/api/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn form_request(body: &str) -> Request<Body> {
    Request::post("/predict")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn index_renders_form() {
    let response = router(state(true))
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("<form method=\"post\" action=\"/predict\">"));
    assert!(html.contains("Newport Beach"));
    assert!(!html.contains("Model files not found"));
}

#[tokio::test]
async fn index_warns_without_model() {
    let response = router(state(false))
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let html = body_string(response).await;
    assert!(html.contains("Model files not found"));
}

#[tokio::test]
async fn form_submission_shows_price() {
    let response = router(state(true))
        .oneshot(form_request(
            "area=2500&bedrooms=4&bathrooms=3&mainroad=Yes&basement=No&parking=3\
             &city=Irvine&street=921+Isabella+Way",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("₹ 2,750,000"));
    assert!(html.contains("921 Isabella Way"));
    assert!(html.contains(r#"<option value="Irvine" selected>Irvine</option>"#));
}

#[tokio::test]
async fn form_submission_out_of_range_is_rejected() {
    let response = router(state(true))
        .oneshot(form_request(
            "area=2500&bedrooms=40&bathrooms=3&mainroad=Yes&basement=No&parking=3&city=Brea",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_string(response).await;
    assert!(html.contains("invalid bedrooms"));
}

#[tokio::test]
async fn form_submission_without_model_is_unavailable() {
    let response = router(state(false))
        .oneshot(form_request(
            "area=2500&bedrooms=4&bathrooms=3&mainroad=Yes&basement=No&parking=3&city=Brea",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn api_predicts_and_formats() {
    let response = router(state(true))
        .oneshot(json_request(json!({
            "area": 3000.0,
            "bedrooms": 3,
            "bathrooms": 2,
            "mainroad": false,
            "basement": true,
            "parking": 1,
            "city": "Brea"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["price"], json!(3_000_000.0));
    assert_eq!(body["formatted"], json!("₹ 3,000,000"));
}

#[tokio::test]
async fn api_treats_unknown_city_as_no_city() {
    let response = router(state(true))
        .oneshot(json_request(json!({
            "area": 1000.0,
            "bedrooms": 2,
            "bathrooms": 1,
            "mainroad": true,
            "basement": false,
            "parking": 0,
            "city": "Springfield",
            "street": "742 Evergreen Terrace"
        })))
        .await
        .unwrap();
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["price"], json!(1_000_000.0));
}

#[tokio::test]
async fn api_errors_carry_status() {
    let response = router(state(true))
        .oneshot(json_request(json!({
            "area": 100.0,
            "bedrooms": 2,
            "bathrooms": 1,
            "mainroad": true,
            "basement": false,
            "parking": 0,
            "city": "Brea"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(body["error"].as_str().unwrap().contains("area"));

    let response = router(state(false))
        .oneshot(json_request(json!({
            "area": 1000.0,
            "bedrooms": 2,
            "bathrooms": 1,
            "mainroad": true,
            "basement": false,
            "parking": 0,
            "city": "Brea"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

async fn assert_json_error(response: axum::response::Response) -> String {
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    body["error"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn api_undecodable_bodies_use_json_errors() {
    let response = router(state(true))
        .oneshot(json_request(json!({ "area": 1000.0, "bedrooms": -2 })))
        .await
        .unwrap();
    let message = assert_json_error(response).await;
    assert!(message.starts_with("invalid request"));

    let response = router(state(true))
        .oneshot(
            Request::post("/api/predict")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"area\": 1000.0,"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_json_error(response).await;

    let response = router(state(true))
        .oneshot(
            Request::post("/api/predict")
                .body(Body::from(r#"{"area": 1000.0}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_json_error(response).await;
}

#[tokio::test]
async fn form_missing_field_renders_inline_error() {
    let response = router(state(true))
        .oneshot(form_request(
            "area=2500&bedrooms=4&bathrooms=3&mainroad=Yes&basement=No&parking=3",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let html = body_string(response).await;
    assert!(html.contains(r#"<div class="error">invalid request"#));
    assert!(html.contains("<form method=\"post\" action=\"/predict\">"));
}

#[tokio::test]
async fn health_reports_model_state() {
    let response = router(state(false))
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body, json!({ "status": "ok", "model_loaded": false }));
}

/// Records the name of every span opened while installed.
#[derive(Clone, Default)]
struct SpanNames(Arc<Mutex<Vec<String>>>);

impl<S: tracing::Subscriber> Layer<S> for SpanNames {
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        self.0.lock().unwrap().push(attrs.metadata().name().to_string());
    }
}

#[tokio::test]
async fn api_requests_open_handler_and_prediction_spans() {
    let names = SpanNames::default();
    let subscriber = tracing_subscriber::registry().with(names.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let response = router(state(true))
        .oneshot(json_request(json!({
            "area": 1500.0,
            "bedrooms": 2,
            "bathrooms": 1,
            "mainroad": true,
            "basement": false,
            "parking": 1,
            "city": "Irvine"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let names = names.0.lock().unwrap().clone();
    assert!(names.iter().any(|n| n == "predict_json"), "{names:?}");
    assert!(names.iter().any(|n| n == "predict"), "{names:?}");
}
