//! Forecast-serving pipeline.
//!
//! [`ForecastService`] owns the immutable registry and configuration and runs
//! every request through the same four stages: model selection, exogenous
//! alignment, forecast invocation and calendar assembly.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::calendar::{assemble, build_calendar, parse_date, Cadence, ForecastPoint};
use crate::config::ServerConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::features::{align, ExogMatrix, ExogTable};
use crate::models::Forecaster;
use crate::registry::{ModelRegistry, ModelSummary};

/// Exogenous input as sent by callers, normally `{feature: [values...]}`.
///
/// Kept as raw JSON so that an unreadable table is dropped without failing
/// the request.
pub type ExogData = Value;

pub const DEFAULT_STEPS: usize = 30;

fn default_forecast_type() -> String {
    Cadence::Daily.as_str().to_string()
}

fn default_steps() -> usize {
    DEFAULT_STEPS
}

/// Single forecast request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    /// Model to use; the latest retrained model when absent or unknown
    #[serde(default)]
    pub model_name: Option<String>,
    /// `daily`, `weekly`, `biweekly` or `monthly`; anything else means daily
    #[serde(default = "default_forecast_type")]
    pub forecast_type: String,
    /// Forecast horizon
    #[serde(default = "default_steps")]
    pub steps: usize,
    /// First forecast date; today when absent
    #[serde(default)]
    pub start_date: Option<String>,
    /// Optional regressors for the forecast horizon
    #[serde(default)]
    pub exog_data: Option<ExogData>,
}

impl Default for ForecastRequest {
    fn default() -> Self {
        Self {
            model_name: None,
            forecast_type: default_forecast_type(),
            steps: DEFAULT_STEPS,
            start_date: None,
            exog_data: None,
        }
    }
}

/// Metadata attached to a forecast result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetadata {
    pub model_order: String,
    pub seasonal_order: String,
    pub exogenous_used: bool,
    pub timestamp: DateTime<Utc>,
}

/// Dated forecast for a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub model_used: String,
    pub forecast_type: String,
    pub total_predictions: usize,
    pub start_date: String,
    pub end_date: NaiveDate,
    pub predictions: Vec<ForecastPoint>,
    pub metadata: ForecastMetadata,
}

/// One-step forecasts for a list of dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub dates: Vec<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub exog_data: Option<ExogData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub total_predictions: usize,
    pub predictions: Vec<ForecastPoint>,
}

/// Static description of the service and its capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub description: String,
    pub models_available: usize,
    pub exogenous_features: usize,
    pub supported_forecast_types: Vec<String>,
    pub endpoints: BTreeMap<String, String>,
}

/// Borrowed view of the inputs to one forecast run.
struct RunParams<'a> {
    model_name: Option<&'a str>,
    forecast_type: &'a str,
    steps: usize,
    start_date: Option<&'a str>,
    exog_data: Option<&'a ExogData>,
}

/// Request pipeline over an immutable model registry.
#[derive(Debug)]
pub struct ForecastService {
    registry: ModelRegistry,
    config: ServerConfig,
}

impl ForecastService {
    pub fn new(registry: ModelRegistry, config: ServerConfig) -> Self {
        Self { registry, config }
    }

    /// Load the registry described by `config`.
    pub fn from_config(config: ServerConfig) -> ServiceResult<Self> {
        let registry = ModelRegistry::load(&config.model_dir, &config.model_extension)?;
        info!("Configured {} exogenous features", config.exog_features.len());
        Ok(Self::new(registry, config))
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn models_loaded(&self) -> usize {
        self.registry.len()
    }

    pub fn list_models(&self) -> Vec<ModelSummary> {
        self.registry.list()
    }

    /// Conform caller exogenous data to the configured layout.
    ///
    /// Returns `None` when no data was sent or when it cannot be read as a
    /// table; the forecast then proceeds without regressors.
    pub fn prepare_exog(&self, exog_data: Option<&ExogData>, steps: usize) -> Option<ExogMatrix> {
        let data = match exog_data {
            None | Some(Value::Null) => return None,
            Some(Value::Object(map)) if map.is_empty() => return None,
            Some(data) => data,
        };
        match ExogTable::try_from(data) {
            Ok(table) => Some(align(&table, &self.config.exog_features, steps)),
            Err(e) => {
                error!("Error processing exogenous data: {}", e);
                None
            }
        }
    }

    /// Run a single forecast request.
    pub fn predict(&self, request: &ForecastRequest) -> ServiceResult<ForecastResult> {
        self.run(RunParams {
            model_name: request.model_name.as_deref(),
            forecast_type: &request.forecast_type,
            steps: request.steps,
            start_date: request.start_date.as_deref(),
            exog_data: request.exog_data.as_ref(),
        })
    }

    /// Run a one-step daily forecast per date, sequentially.
    ///
    /// Dates whose forecast fails are skipped.
    pub fn predict_batch(&self, request: &BatchRequest) -> BatchResult {
        let mut predictions = Vec::with_capacity(request.dates.len());
        for date in &request.dates {
            let outcome = self.run(RunParams {
                model_name: request.model_name.as_deref(),
                forecast_type: Cadence::Daily.as_str(),
                steps: 1,
                start_date: Some(date),
                exog_data: request.exog_data.as_ref(),
            });
            match outcome {
                Ok(result) => predictions.extend(result.predictions.into_iter().next()),
                Err(e) => warn!("Skipping batch date {}: {}", date, e),
            }
        }

        BatchResult {
            total_predictions: predictions.len(),
            predictions,
        }
    }

    pub fn info(&self) -> ServiceInfo {
        let endpoints = [
            ("health", "/health"),
            ("models", "/v1/models"),
            ("predict", "/v1/predict"),
            ("batch_predict", "/v1/predict/batch"),
            ("info", "/v1/info"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        ServiceInfo {
            service: "SARIMAX Time Series Forecasting".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Expanding window SARIMAX forecasting for City Gas-CNG demand".to_string(),
            models_available: self.registry.len(),
            exogenous_features: self.config.exog_features.len(),
            supported_forecast_types: Cadence::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            endpoints,
        }
    }

    fn run(&self, params: RunParams<'_>) -> ServiceResult<ForecastResult> {
        let steps = params.steps;
        if steps == 0 || steps > self.config.max_steps {
            return Err(ServiceError::validation(format!(
                "steps must be between 1 and {}, got {}",
                self.config.max_steps, steps
            )));
        }

        let (start, start_label) = match params.start_date {
            Some(s) => (parse_date(s)?, s.to_string()),
            None => {
                let today = chrono::Local::now().date_naive();
                (today, today.format("%Y-%m-%d").to_string())
            }
        };
        let cadence = Cadence::parse_or_daily(params.forecast_type);
        let dates = build_calendar(start, steps, cadence)?;

        let (model_name, model) = self
            .registry
            .select(params.model_name, &self.config.default_model)?;

        let exog = self.prepare_exog(params.exog_data, steps);

        info!(
            "Generating {} forecast for {} steps from {}",
            params.forecast_type, steps, start_label
        );
        let values = invoke(model.as_ref(), steps, exog.as_ref())?;

        let predictions = assemble(&dates, &values);
        let end_date = *dates
            .last()
            .ok_or_else(|| ServiceError::validation("empty forecast calendar"))?;
        info!("Successfully generated {} predictions", predictions.len());

        Ok(ForecastResult {
            model_used: model_name,
            forecast_type: params.forecast_type.to_string(),
            total_predictions: predictions.len(),
            start_date: start_label,
            end_date,
            predictions,
            metadata: ForecastMetadata {
                model_order: model.order().to_string(),
                seasonal_order: model.seasonal_order().to_string(),
                exogenous_used: exog.is_some(),
                timestamp: Utc::now(),
            },
        })
    }
}

/// Call the model's forecast, logging and classifying any failure.
pub fn invoke(model: &dyn Forecaster, steps: usize, exog: Option<&ExogMatrix>) -> ServiceResult<Vec<f64>> {
    model.forecast(steps, exog).map_err(|e| {
        error!("Error in forecasting: {}", e);
        ServiceError::forecast_failure(e.to_string())
    })
}

/// Shared handle used by the HTTP layer.
pub type SharedService = Arc<ForecastService>;
