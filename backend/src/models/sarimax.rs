//! SARIMAX forecasting from a fitted-parameter artifact.
//!
//! An artifact carries the estimated coefficients together with the tail of
//! the training sample (and, when the model has regressors, the matching
//! exogenous rows). Forecasting evaluates the model recursion:
//!
//! ```text
//! u_t = y_t - β·x_t                        regression error
//! w_t = (1 - L)^d (1 - L^s)^D u_t          differenced error
//! φ(L) Φ(L^s) w_t = c + θ(L) Θ(L^s) ε_t    seasonal ARMA
//! ```
//!
//! Future innovations are zero, so an h-step forecast is the conditional
//! expectation given the stored history.

use serde::{Deserialize, Serialize};

use super::{Forecaster, ModelError, Order, SeasonalOrder};
use crate::features::ExogMatrix;

fn default_model_type() -> String {
    "SARIMAX".to_string()
}

fn default_sigma2() -> f64 {
    1.0
}

/// Estimated coefficients of a SARIMAX model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SarimaxParams {
    /// Constant of the differenced ARMA equation
    #[serde(default)]
    pub intercept: f64,
    /// Non-seasonal AR coefficients φ₁..φₚ
    #[serde(default)]
    pub ar: Vec<f64>,
    /// Non-seasonal MA coefficients θ₁..θ_q
    #[serde(default)]
    pub ma: Vec<f64>,
    /// Seasonal AR coefficients Φ₁..Φ_P
    #[serde(default)]
    pub seasonal_ar: Vec<f64>,
    /// Seasonal MA coefficients Θ₁..Θ_Q
    #[serde(default)]
    pub seasonal_ma: Vec<f64>,
    /// Regressor names, in fitted order
    #[serde(default)]
    pub exog_names: Vec<String>,
    /// Regression coefficients β, one per regressor
    #[serde(default)]
    pub exog_coefficients: Vec<f64>,
    /// Innovation variance
    #[serde(default = "default_sigma2")]
    pub sigma2: f64,
}

/// A fitted SARIMAX model as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarimaxModel {
    #[serde(default = "default_model_type")]
    model_type: String,
    order: Order,
    #[serde(default)]
    seasonal_order: SeasonalOrder,
    params: SarimaxParams,
    /// Training observations, oldest first.
    endog: Vec<f64>,
    /// Regressor rows aligned with `endog`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    exog_history: Vec<Vec<f64>>,
    /// Innovations aligned with the end of `endog`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    residuals: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nobs: Option<usize>,
}

impl SarimaxModel {
    /// Create and validate a model without regressors or stored residuals.
    pub fn new(
        order: Order,
        seasonal_order: SeasonalOrder,
        params: SarimaxParams,
        endog: Vec<f64>,
    ) -> Result<Self, ModelError> {
        let model = Self {
            model_type: default_model_type(),
            order,
            seasonal_order,
            params,
            endog,
            exog_history: Vec::new(),
            residuals: Vec::new(),
            nobs: None,
        };
        model.validate()?;
        Ok(model)
    }

    /// Attach the regressor rows observed alongside `endog`.
    pub fn with_exog_history(mut self, rows: Vec<Vec<f64>>) -> Result<Self, ModelError> {
        self.exog_history = rows;
        self.validate()?;
        Ok(self)
    }

    /// Attach in-sample innovations, aligned with the end of `endog`.
    pub fn with_residuals(mut self, residuals: Vec<f64>) -> Result<Self, ModelError> {
        self.residuals = residuals;
        self.validate()?;
        Ok(self)
    }

    /// Record the full training sample size when `endog` holds only a tail.
    pub fn with_nobs(mut self, nobs: usize) -> Self {
        self.nobs = Some(nobs);
        self
    }

    /// Decode and validate a JSON artifact.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        let model: Self = serde_json::from_slice(bytes)
            .map_err(|e| ModelError::InvalidArtifact(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    pub fn params(&self) -> &SarimaxParams {
        &self.params
    }

    /// Check the artifact is self-consistent and carries enough history.
    pub fn validate(&self) -> Result<(), ModelError> {
        let Order(p, _, q) = self.order;
        let SeasonalOrder(big_p, _, big_q, s) = self.seasonal_order;
        let params = &self.params;

        let counts = [
            ("ar", p, params.ar.len()),
            ("ma", q, params.ma.len()),
            ("seasonal_ar", big_p, params.seasonal_ar.len()),
            ("seasonal_ma", big_q, params.seasonal_ma.len()),
        ];
        for (name, expected, actual) in counts {
            if expected != actual {
                return Err(invalid(format!(
                    "{} has {} coefficients but the order requires {}",
                    name, actual, expected
                )));
            }
        }

        if self.seasonal_order.has_seasonal_terms() && s < 2 {
            return Err(invalid(format!("seasonal period must be at least 2, got {}", s)));
        }

        let k = params.exog_names.len();
        if params.exog_coefficients.len() != k {
            return Err(invalid(format!(
                "{} exogenous coefficients for {} exogenous names",
                params.exog_coefficients.len(),
                k
            )));
        }
        if k > 0 {
            if self.exog_history.len() != self.endog.len() {
                return Err(invalid(format!(
                    "exog_history has {} rows but endog has {}",
                    self.exog_history.len(),
                    self.endog.len()
                )));
            }
            if let Some(row) = self.exog_history.iter().position(|r| r.len() != k) {
                return Err(invalid(format!("exog_history row {} does not have {} values", row, k)));
            }
        } else if !self.exog_history.is_empty() {
            return Err(invalid("exog_history given for a model without exogenous regressors"));
        }

        if self.residuals.len() > self.endog.len() {
            return Err(invalid("more residuals than observations"));
        }

        let all_finite = std::iter::once(&params.intercept)
            .chain(&params.ar)
            .chain(&params.ma)
            .chain(&params.seasonal_ar)
            .chain(&params.seasonal_ma)
            .chain(&params.exog_coefficients)
            .chain(&self.endog)
            .chain(&self.residuals)
            .chain(self.exog_history.iter().flatten())
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(invalid("artifact contains NaN or infinite values"));
        }

        let required = self.differencing_poly().len() - 1 + self.ar_poly().len() - 1;
        if self.endog.is_empty() || self.endog.len() < required {
            return Err(invalid(format!(
                "endog holds {} observations, at least {} required",
                self.endog.len(),
                required.max(1)
            )));
        }

        Ok(())
    }

    /// `φ(L) Φ(L^s)` with the sign convention `1 - Σ a_i L^i`.
    fn ar_poly(&self) -> Vec<f64> {
        poly_mul(
            &lag_poly(&self.params.ar, -1.0, 1),
            &lag_poly(&self.params.seasonal_ar, -1.0, self.seasonal_order.3),
        )
    }

    /// `θ(L) Θ(L^s)` with the sign convention `1 + Σ b_j L^j`.
    fn ma_poly(&self) -> Vec<f64> {
        poly_mul(
            &lag_poly(&self.params.ma, 1.0, 1),
            &lag_poly(&self.params.seasonal_ma, 1.0, self.seasonal_order.3),
        )
    }

    /// `(1 - L)^d (1 - L^s)^D`.
    fn differencing_poly(&self) -> Vec<f64> {
        let mut poly = vec![1.0];
        for _ in 0..self.order.1 {
            poly = poly_mul(&poly, &[1.0, -1.0]);
        }
        for _ in 0..self.seasonal_order.1 {
            poly = poly_mul(&poly, &lag_poly(&[1.0], -1.0, self.seasonal_order.3));
        }
        poly
    }

    fn regression(&self, row: &[f64]) -> f64 {
        self.params
            .exog_coefficients
            .iter()
            .zip(row)
            .map(|(beta, x)| beta * x)
            .sum()
    }

    /// Resolve the future regressor rows for a `steps`-ahead forecast.
    fn future_exog<'a>(
        &self,
        steps: usize,
        exog: Option<&'a ExogMatrix>,
    ) -> Result<Option<&'a ExogMatrix>, ModelError> {
        let names = &self.params.exog_names;
        match exog {
            None if names.is_empty() => Ok(None),
            None => Err(ModelError::MissingExog { expected: names.len() }),
            Some(matrix) if names.is_empty() => Err(ModelError::ExogMismatch(format!(
                "model was fitted without regressors but {} columns were provided",
                matrix.n_cols()
            ))),
            Some(matrix) => {
                if matrix.columns() != names.as_slice() {
                    return Err(ModelError::ExogMismatch(format!(
                        "expected {} columns in fitted order, got {}",
                        names.len(),
                        matrix.n_cols()
                    )));
                }
                if matrix.n_rows() < steps {
                    return Err(ModelError::ExogMismatch(format!(
                        "{} rows provided for a {}-step forecast",
                        matrix.n_rows(),
                        steps
                    )));
                }
                Ok(Some(matrix))
            }
        }
    }
}

impl Forecaster for SarimaxModel {
    fn forecast(&self, steps: usize, exog: Option<&ExogMatrix>) -> Result<Vec<f64>, ModelError> {
        let future = self.future_exog(steps, exog)?;
        if steps == 0 {
            return Ok(Vec::new());
        }

        let n = self.endog.len();
        let diff = self.differencing_poly();
        let ar = self.ar_poly();
        let ma = self.ma_poly();
        let diff_deg = diff.len() - 1;

        let mut u: Vec<f64> = if self.exog_history.is_empty() {
            self.endog.clone()
        } else {
            self.endog
                .iter()
                .zip(&self.exog_history)
                .map(|(y, row)| y - self.regression(row))
                .collect()
        };
        u.reserve(steps);

        // Entries before `diff_deg` are never read by the AR recursion.
        let mut w = vec![0.0; n + steps];
        for t in diff_deg..n {
            w[t] = diff.iter().enumerate().map(|(j, c)| c * u[t - j]).sum();
        }

        let mut eps = vec![0.0; n + steps];
        let offset = n - self.residuals.len();
        eps[offset..n].copy_from_slice(&self.residuals);

        let mut out = Vec::with_capacity(steps);
        for h in 0..steps {
            let t = n + h;

            let ar_part: f64 = (1..ar.len()).map(|i| -ar[i] * w[t - i]).sum();
            let ma_part: f64 = (1..ma.len()).filter(|j| *j <= t).map(|j| ma[j] * eps[t - j]).sum();
            w[t] = self.params.intercept + ar_part + ma_part;

            let integrated: f64 = (1..diff.len()).map(|j| diff[j] * u[t - j]).sum();
            u.push(w[t] - integrated);

            let y = match future {
                Some(matrix) => u[t] + self.regression(matrix.row(h)),
                None => u[t],
            };
            if !y.is_finite() {
                return Err(ModelError::NonFinite { step: h + 1 });
            }
            out.push(y);
        }

        Ok(out)
    }

    fn model_type(&self) -> &str {
        &self.model_type
    }

    fn order(&self) -> Order {
        self.order
    }

    fn seasonal_order(&self) -> SeasonalOrder {
        self.seasonal_order
    }

    fn nobs(&self) -> usize {
        self.nobs.unwrap_or(self.endog.len())
    }

    fn exog_names(&self) -> &[String] {
        &self.params.exog_names
    }
}

fn invalid(message: impl Into<String>) -> ModelError {
    ModelError::InvalidArtifact(message.into())
}

/// `1 + sign * Σ c_i L^(i * stride)`.
fn lag_poly(coeffs: &[f64], sign: f64, stride: usize) -> Vec<f64> {
    let mut poly = vec![0.0; coeffs.len() * stride + 1];
    poly[0] = 1.0;
    for (i, c) in coeffs.iter().enumerate() {
        poly[(i + 1) * stride] = sign * c;
    }
    poly
}

fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}
