//! Data Transfer Objects for the HTTP API.
//!
//! Request and result types of the forecast pipeline already derive
//! Serialize/Deserialize and are re-exported here; this module adds the
//! endpoint-specific envelopes and body decoding.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{AppError, DATES_REQUIRED, NO_JSON_DATA};

// Re-export existing DTOs that are already serializable
pub use crate::calendar::ForecastPoint;
pub use crate::registry::ModelSummary;
pub use crate::service::{
    BatchRequest, BatchResult, ExogData, ForecastMetadata, ForecastRequest, ForecastResult, ServiceInfo,
};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Number of models in the registry
    pub models_loaded: usize,
    pub timestamp: DateTime<Utc>,
}

/// Model list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelListResponse {
    /// Registered models, ordered by name
    pub models: Vec<ModelSummary>,
    /// Total count
    pub total: usize,
}

/// Decode a request body as a non-empty JSON object.
///
/// Missing, malformed, non-object and empty-object bodies are all rejected
/// with the same message.
pub fn json_object(body: &[u8]) -> Result<Map<String, Value>, AppError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => Ok(map),
        _ => Err(AppError::BadRequest(NO_JSON_DATA.to_string())),
    }
}

/// Decode a typed request from a JSON object.
pub fn from_object<T: DeserializeOwned>(map: Map<String, Value>) -> Result<T, AppError> {
    serde_json::from_value(Value::Object(map))
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))
}

pub fn parse_forecast_request(body: &[u8]) -> Result<ForecastRequest, AppError> {
    from_object(json_object(body)?)
}

pub fn parse_batch_request(body: &[u8]) -> Result<BatchRequest, AppError> {
    let map = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| match v {
            Value::Object(map) if map.contains_key("dates") => Some(map),
            _ => None,
        })
        .ok_or_else(|| AppError::BadRequest(DATES_REQUIRED.to_string()))?;
    from_object(map)
}
