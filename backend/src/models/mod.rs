//! Fitted forecasting models.
//!
//! The registry treats every model as an opaque [`Forecaster`]: something that
//! can forecast N steps given optional exogenous rows and can describe its own
//! structure. [`sarimax::SarimaxModel`] is the implementation backing the
//! artifacts shipped with the service.

pub mod sarimax;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::features::ExogMatrix;

pub use sarimax::{SarimaxModel, SarimaxParams};

/// Errors raised by a fitted model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// The serialized artifact is internally inconsistent.
    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),

    /// The model was fitted with regressors but none were supplied.
    #[error("model requires {expected} exogenous columns but none were provided")]
    MissingExog { expected: usize },

    /// Supplied regressors do not match what the model was fitted with.
    #[error("exogenous input mismatch: {0}")]
    ExogMismatch(String),

    /// The recursion produced NaN or infinite values.
    #[error("forecast produced non-finite values at step {step}")]
    NonFinite { step: usize },
}

/// Non-seasonal ARIMA order `(p, d, q)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Order(pub usize, pub usize, pub usize);

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0, self.1, self.2)
    }
}

/// Seasonal order `(P, D, Q, s)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeasonalOrder(pub usize, pub usize, pub usize, pub usize);

impl SeasonalOrder {
    pub fn has_seasonal_terms(&self) -> bool {
        self.0 + self.1 + self.2 > 0
    }
}

impl fmt::Display for SeasonalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.0, self.1, self.2, self.3)
    }
}

/// Black-box fitted model.
pub trait Forecaster: Send + Sync + fmt::Debug {
    /// Forecast `steps` values past the end of the training sample.
    ///
    /// When supplied, `exog` must hold one row per step.
    fn forecast(&self, steps: usize, exog: Option<&ExogMatrix>) -> Result<Vec<f64>, ModelError>;

    /// Model family name, e.g. `"SARIMAX"`.
    fn model_type(&self) -> &str;

    fn order(&self) -> Order;

    fn seasonal_order(&self) -> SeasonalOrder;

    /// Number of observations the model was fitted on.
    fn nobs(&self) -> usize;

    /// Names of the exogenous regressors, in fitted order.
    fn exog_names(&self) -> &[String];
}
