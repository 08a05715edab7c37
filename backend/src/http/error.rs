//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

pub const NO_JSON_DATA: &str = "No JSON data provided";
pub const DATES_REQUIRED: &str = "dates field is required";
pub const NO_MODEL_AVAILABLE: &str = "No model available";
pub const FORECAST_FAILED: &str = "Forecast generation failed";

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable error message
    pub error: String,
    /// Error kind for programmatic handling
    pub kind: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(kind: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            kind: kind.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Invalid request (validation error)
    BadRequest(String),
    /// Error raised by the forecast pipeline
    Service(ServiceError),
    /// Internal server error
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("validation_error", msg),
            ),
            AppError::Service(err) => {
                let kind = err.kind();
                match err {
                    ServiceError::Validation(msg) => (StatusCode::BAD_REQUEST, ApiError::new(kind, msg)),
                    ServiceError::ModelUnavailable(msg) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::new(kind, NO_MODEL_AVAILABLE).with_details(msg),
                    ),
                    ServiceError::ForecastFailure(msg) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::new(kind, FORECAST_FAILED).with_details(msg),
                    ),
                    ServiceError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, ApiError::new(kind, msg)),
                }
            }
            AppError::Internal(msg) => {
                tracing::error!("Unhandled error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new("internal_error", msg),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        AppError::Service(err)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Task join error: {}", err))
    }
}
