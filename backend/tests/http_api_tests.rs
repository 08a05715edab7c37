//! End-to-end tests of the REST API against models loaded from disk.

#![cfg(feature = "http-server")]

mod support;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use sarimax_serve::config::ServerConfig;
use sarimax_serve::features::default_exog_features;
use sarimax_serve::http::{create_router, AppState};
use sarimax_serve::service::ForecastService;
use support::{exog_model, level_model, seasonal_model, write_model};

/// Router over a fresh model directory; the directory must outlive the router.
fn app(models: &[(&str, sarimax_serve::models::SarimaxModel)]) -> (TempDir, Router) {
    let dir = TempDir::new().unwrap();
    for (name, model) in models {
        write_model(dir.path(), name, model);
    }
    let config = ServerConfig {
        model_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let service = ForecastService::from_config(config).unwrap();
    (dir, create_router(AppState::new(service)))
}

fn default_app() -> (TempDir, Router) {
    app(&[
        ("sarimax_initial_18months", level_model(100.0)),
        ("seasonal_baseline", seasonal_model()),
    ])
}

async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(response).await
}

async fn post(router: Router, uri: &str, body: impl Into<Body>) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();
    read(response).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health_reports_loaded_models() {
    let (_dir, router) = default_app();
    let (status, body) = get(router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["models_loaded"], 2);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_list_models() {
    let (_dir, router) = default_app();
    let (status, body) = get(router, "/v1/models").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    let models = body["models"].as_array().unwrap();
    assert_eq!(models[0]["name"], "sarimax_initial_18months");
    assert_eq!(models[0]["type"], "SARIMAX");
    assert_eq!(models[0]["order"], "(0, 0, 0)");
    assert_eq!(models[1]["name"], "seasonal_baseline");
    assert_eq!(models[1]["seasonal_order"], "(0, 1, 0, 7)");
    assert_eq!(models[1]["n_obs"], 540);
    assert_eq!(models[1]["checksum"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn test_service_info() {
    let (_dir, router) = default_app();
    let (status, body) = get(router, "/v1/info").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["models_available"], 2);
    assert_eq!(body["exogenous_features"], 40);
    assert_eq!(body["supported_forecast_types"], json!(["daily", "weekly", "biweekly", "monthly"]));
    assert_eq!(body["endpoints"]["predict"], "/v1/predict");
}

#[tokio::test]
async fn test_predict_weekly() {
    let (_dir, router) = default_app();
    let request = json!({
        "forecast_type": "weekly",
        "steps": 3,
        "start_date": "2025-10-01"
    });
    let (status, body) = post(router, "/v1/predict", request.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_used"], "sarimax_initial_18months");
    assert_eq!(body["forecast_type"], "weekly");
    assert_eq!(body["total_predictions"], 3);
    assert_eq!(body["start_date"], "2025-10-01");
    assert_eq!(body["end_date"], "2025-10-19");

    let predictions = body["predictions"].as_array().unwrap();
    assert_eq!(predictions[0]["date"], "2025-10-05");
    assert_eq!(predictions[0]["step"], 1);
    assert_eq!(predictions[2]["step"], 3);
    assert_eq!(predictions[0]["predicted_quantity"], 100.0);
    assert_eq!(body["metadata"]["exogenous_used"], false);
}

#[tokio::test]
async fn test_predict_named_seasonal_model_repeats_week() {
    let (_dir, router) = default_app();
    let request = json!({
        "model_name": "seasonal_baseline",
        "steps": 14,
        "start_date": "2025-10-01"
    });
    let (status, body) = post(router, "/v1/predict", request.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_used"], "seasonal_baseline");
    assert_eq!(body["metadata"]["seasonal_order"], "(0, 1, 0, 7)");

    // Synthetic history is exactly periodic, so the seasonal difference is
    // zero and the forecast repeats the last week.
    let values: Vec<f64> = body["predictions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["predicted_quantity"].as_f64().unwrap())
        .collect();
    assert_eq!(&values[..7], &values[7..]);
    assert_eq!(values[0], 100.0);
}

#[tokio::test]
async fn test_predict_unknown_cadence_is_daily() {
    let (_dir, router) = default_app();
    let request = json!({"forecast_type": "hourly", "steps": 2, "start_date": "2025-12-31"});
    let (status, body) = post(router, "/v1/predict", request.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["forecast_type"], "hourly");
    assert_eq!(body["predictions"][0]["date"], "2025-12-31");
    assert_eq!(body["predictions"][1]["date"], "2026-01-01");
}

#[tokio::test]
async fn test_predict_prefers_latest_retrained_model() {
    let (_dir, router) = app(&[
        ("sarimax_initial_18months", level_model(1.0)),
        ("sarimax_retrained_month_2", level_model(2.0)),
        ("sarimax_retrained_month_10", level_model(10.0)),
    ]);
    let request = json!({"model_name": "not_registered", "steps": 1, "start_date": "2025-10-01"});
    let (status, body) = post(router, "/v1/predict", request.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_used"], "sarimax_retrained_month_10");
    assert_eq!(body["predictions"][0]["predicted_quantity"], 10.0);
}

#[tokio::test]
async fn test_predict_with_partial_exog() {
    let (_dir, router) = app(&[("sarimax_initial_18months", exog_model(2.0))]);
    let features = default_exog_features();
    let request = json!({
        "steps": 2,
        "start_date": "2025-10-01",
        "exog_data": { features[0].as_str(): [1.0, 2.0], "unrelated": [9.0, 9.0] }
    });
    let (status, body) = post(router, "/v1/predict", request.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["exogenous_used"], true);
    assert_eq!(body["predictions"][0]["predicted_quantity"], 52.0);
    assert_eq!(body["predictions"][1]["predicted_quantity"], 54.0);
}

#[tokio::test]
async fn test_predict_discards_unreadable_exog() {
    let payloads = [
        json!({"gcv_cal_value_lag_1": [1.0, null]}),
        json!({"gcv_cal_value_lag_1": 5}),
        json!("garbage"),
        json!({"a": [1.0], "b": [1.0, 2.0]}),
    ];
    for exog in payloads {
        let (_dir, router) = default_app();
        let request = json!({"steps": 2, "start_date": "2025-10-01", "exog_data": exog});
        let (status, body) = post(router, "/v1/predict", request.to_string()).await;

        assert_eq!(status, StatusCode::OK, "exog_data {}", request["exog_data"]);
        assert_eq!(body["metadata"]["exogenous_used"], false);
        assert_eq!(body["total_predictions"], 2);
        assert_eq!(body["predictions"][1]["predicted_quantity"], 100.0);
    }
}

#[tokio::test]
async fn test_predict_exog_model_without_exog_fails() {
    let (_dir, router) = app(&[("sarimax_initial_18months", exog_model(2.0))]);
    let (status, body) = post(router, "/v1/predict", json!({"steps": 2}).to_string()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Forecast generation failed");
    assert_eq!(body["kind"], "forecast_failure");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn test_predict_rejects_malformed_json() {
    for payload in ["{not json", "", "{}", "[1, 2, 3]"] {
        let (_dir, router) = default_app();
        let (status, body) = post(router, "/v1/predict", payload).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {:?}", payload);
        assert_eq!(body["error"], "No JSON data provided");
    }
}

#[tokio::test]
async fn test_predict_rejects_out_of_range_steps() {
    let (_dir, router) = default_app();
    let (status, body) = post(router, "/v1/predict", json!({"steps": 0}).to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation_error");
}

#[tokio::test]
async fn test_predict_accepts_compact_and_slashed_dates() {
    for start in ["2025/10/01", "20251001"] {
        let (_dir, router) = default_app();
        let request = json!({"steps": 1, "start_date": start});
        let (status, body) = post(router, "/v1/predict", request.to_string()).await;

        assert_eq!(status, StatusCode::OK, "start_date {}", start);
        assert_eq!(body["start_date"], start);
        assert_eq!(body["predictions"][0]["date"], "2025-10-01");
    }
}

#[tokio::test]
async fn test_predict_rejects_bad_start_date() {
    let (_dir, router) = default_app();
    let request = json!({"steps": 1, "start_date": "31/12/2025"});
    let (status, body) = post(router, "/v1/predict", request.to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation_error");
}

#[tokio::test]
async fn test_predict_without_default_model_is_unavailable() {
    let (_dir, router) = app(&[("some_other_model", level_model(1.0))]);
    let (status, body) = post(router, "/v1/predict", json!({"steps": 5}).to_string()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "No model available");
    assert_eq!(body["kind"], "model_unavailable");
}

#[tokio::test]
async fn test_batch_predict() {
    let (_dir, router) = default_app();
    let request = json!({"dates": ["2025-10-01", "2025-10-02"]});
    let (status, body) = post(router, "/v1/predict/batch", request.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_predictions"], 2);
    let predictions = body["predictions"].as_array().unwrap();
    assert_eq!(predictions[0]["date"], "2025-10-01");
    assert_eq!(predictions[1]["date"], "2025-10-02");
    assert!(predictions.iter().all(|p| p["step"] == 1));
}

#[tokio::test]
async fn test_batch_skips_failed_dates() {
    let (_dir, router) = default_app();
    let request = json!({"dates": ["2025-10-01", "garbage", "2025-10-03"]});
    let (status, body) = post(router, "/v1/predict/batch", request.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_predictions"], 2);
    assert_eq!(body["predictions"][1]["date"], "2025-10-03");
}

#[tokio::test]
async fn test_batch_without_model_returns_empty_list() {
    let (_dir, router) = app(&[("some_other_model", level_model(1.0))]);
    let request = json!({"dates": ["2025-10-01"]});
    let (status, body) = post(router, "/v1/predict/batch", request.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_predictions"], 0);
    assert_eq!(body["predictions"], json!([]));
}

#[tokio::test]
async fn test_batch_requires_dates() {
    let (_dir, router) = default_app();
    let (status, body) = post(router, "/v1/predict/batch", json!({"model_name": "x"}).to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "dates field is required");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (_dir, router) = default_app();
    let response = router
        .oneshot(Request::builder().uri("/v2/predict").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
