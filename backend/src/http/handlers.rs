//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! forecast service for business logic.

use axum::{body::Bytes, extract::State, Json};

use super::dto::{
    parse_batch_request, parse_forecast_request, BatchResult, ForecastResult, HealthResponse,
    ModelListResponse, ServiceInfo,
};
use super::error::AppError;
use super::state::AppState;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint reporting how many models are loaded.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        models_loaded: state.service.models_loaded(),
        timestamp: chrono::Utc::now(),
    }))
}

// =============================================================================
// Model Catalogue
// =============================================================================

/// GET /v1/models
///
/// List all loaded models with their orders and sample sizes.
pub async fn list_models(State(state): State<AppState>) -> HandlerResult<ModelListResponse> {
    let models = state.service.list_models();
    let total = models.len();

    Ok(Json(ModelListResponse { models, total }))
}

/// GET /v1/info
///
/// Static description of the service and its endpoints.
pub async fn service_info(State(state): State<AppState>) -> HandlerResult<ServiceInfo> {
    Ok(Json(state.service.info()))
}

// =============================================================================
// Forecasting
// =============================================================================

/// POST /v1/predict
///
/// Forecast `steps` values on the requested cadence.
pub async fn predict(State(state): State<AppState>, body: Bytes) -> HandlerResult<ForecastResult> {
    let request = parse_forecast_request(&body)?;
    tracing::debug!(model = ?request.model_name, steps = request.steps, "predict request");

    // Forecast recursion is CPU-bound; keep it off the async workers.
    let service = state.service.clone();
    let result = tokio::task::spawn_blocking(move || service.predict(&request)).await??;

    Ok(Json(result))
}

/// POST /v1/predict/batch
///
/// One-step daily forecast for each date in the request.
pub async fn predict_batch(State(state): State<AppState>, body: Bytes) -> HandlerResult<BatchResult> {
    let request = parse_batch_request(&body)?;
    tracing::debug!(dates = request.dates.len(), "batch predict request");

    let service = state.service.clone();
    let result = tokio::task::spawn_blocking(move || service.predict_batch(&request)).await?;

    Ok(Json(result))
}
