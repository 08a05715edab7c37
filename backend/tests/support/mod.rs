#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use sarimax_serve::features::default_exog_features;
use sarimax_serve::models::{Order, SarimaxModel, SarimaxParams, SeasonalOrder};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Model that forecasts a constant `level` at every step.
pub fn level_model(level: f64) -> SarimaxModel {
    SarimaxModel::new(
        Order(0, 0, 0),
        SeasonalOrder::default(),
        SarimaxParams {
            intercept: level,
            sigma2: 1.0,
            ..Default::default()
        },
        vec![level; 3],
    )
    .expect("valid level model")
}

/// AR(1) with drift-free daily seasonality, fitted on a short synthetic tail.
pub fn seasonal_model() -> SarimaxModel {
    let endog: Vec<f64> = (0..28).map(|i| 100.0 + (i % 7) as f64 * 5.0).collect();
    SarimaxModel::new(
        Order(1, 0, 0),
        SeasonalOrder(0, 1, 0, 7),
        SarimaxParams {
            ar: vec![0.3],
            sigma2: 4.0,
            ..Default::default()
        },
        endog,
    )
    .expect("valid seasonal model")
    .with_nobs(540)
}

/// Model regressing on the production feature layout; only the first
/// feature carries weight (`coefficient`).
pub fn exog_model(coefficient: f64) -> SarimaxModel {
    let features = default_exog_features();
    let k = features.len();
    let mut coefficients = vec![0.0; k];
    coefficients[0] = coefficient;
    SarimaxModel::new(
        Order(0, 0, 0),
        SeasonalOrder::default(),
        SarimaxParams {
            intercept: 50.0,
            exog_names: features,
            exog_coefficients: coefficients,
            sigma2: 1.0,
            ..Default::default()
        },
        vec![50.0, 50.0],
    )
    .expect("valid exog model")
    .with_exog_history(vec![vec![0.0; k]; 2])
    .expect("valid exog history")
}

/// Write a model artifact as `<dir>/<name>.json`.
pub fn write_model(dir: &Path, name: &str, model: &SarimaxModel) {
    let bytes = serde_json::to_vec_pretty(model).expect("serialize model");
    std::fs::write(dir.join(format!("{}.json", name)), bytes).expect("write model artifact");
}
