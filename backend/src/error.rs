//! Error types shared by the forecasting pipeline.
//!
//! Every failure the service can produce collapses into one of four kinds.
//! The HTTP layer maps each kind onto a status code; the binary treats
//! [`ServiceError::Config`] raised during startup as fatal.

/// Result type for pipeline operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Closed set of error kinds raised by the service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Missing model directory, unreadable artifacts, invalid settings.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request could not be accepted as sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// No registered model satisfies the selection policy.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The selected model failed to produce a forecast.
    #[error("Forecast failure: {0}")]
    ForecastFailure(String),
}

impl ServiceError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn model_unavailable(message: impl Into<String>) -> Self {
        Self::ModelUnavailable(message.into())
    }

    pub fn forecast_failure(message: impl Into<String>) -> Self {
        Self::ForecastFailure(message.into())
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::Validation(_) => "validation_error",
            Self::ModelUnavailable(_) => "model_unavailable",
            Self::ForecastFailure(_) => "forecast_failure",
        }
    }

    /// The message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Config(m) | Self::Validation(m) | Self::ModelUnavailable(m) | Self::ForecastFailure(m) => m,
        }
    }
}
