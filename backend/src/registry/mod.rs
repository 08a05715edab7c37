//! In-memory registry of fitted models.
//!
//! The registry is populated once at startup from a directory of model
//! artifacts and never mutated afterwards, so it can be shared freely across
//! request handlers behind an `Arc`.

pub mod checksum;
pub mod selection;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};
use crate::models::{Forecaster, SarimaxModel};

pub use checksum::calculate_checksum;
pub use selection::{latest_retrained, natural_cmp};

/// A loaded model plus the fingerprint of the artifact it came from.
#[derive(Debug, Clone)]
pub struct RegisteredModel {
    pub model: Arc<dyn Forecaster>,
    pub checksum: String,
}

/// Model description returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub model_type: String,
    pub order: String,
    pub seasonal_order: String,
    pub n_obs: usize,
    pub checksum: String,
}

/// Name to model mapping, ordered by name.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, RegisteredModel>,
}

impl ModelRegistry {
    /// Build a registry from already constructed models.
    pub fn from_models<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = (S, RegisteredModel)>,
        S: Into<String>,
    {
        Self {
            models: models.into_iter().map(|(name, m)| (name.into(), m)).collect(),
        }
    }

    /// Load every `*.{extension}` artifact in `dir`.
    ///
    /// The model name is the file stem. Loading is all-or-nothing: one
    /// unreadable or invalid artifact fails the whole load.
    pub fn load(dir: &Path, extension: &str) -> ServiceResult<Self> {
        info!("Loading models from {}", dir.display());

        if !dir.is_dir() {
            error!("Model directory not found: {}", dir.display());
            return Err(ServiceError::config(format!(
                "Model directory not found: {}",
                dir.display()
            )));
        }

        let entries = fs::read_dir(dir).map_err(|e| {
            ServiceError::config(format!("Failed to read model directory {}: {}", dir.display(), e))
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| ServiceError::config(format!("Failed to read model directory entry: {}", e)))?
                .path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            error!("No model files found in models directory");
            return Err(ServiceError::config(format!(
                "No *.{} model files found in {}",
                extension,
                dir.display()
            )));
        }
        info!("Found {} model files", paths.len());

        let mut models = BTreeMap::new();
        for path in paths {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| ServiceError::config(format!("Invalid model file name: {}", path.display())))?
                .to_string();

            let bytes = fs::read(&path)
                .map_err(|e| ServiceError::config(format!("Failed to read {}: {}", path.display(), e)))?;
            let model = SarimaxModel::from_json_slice(&bytes).map_err(|e| {
                error!("Error loading model {}: {}", name, e);
                ServiceError::config(format!("Failed to load model '{}': {}", name, e))
            })?;

            info!("Loaded model: {}", name);
            models.insert(
                name,
                RegisteredModel {
                    model: Arc::new(model),
                    checksum: calculate_checksum(&bytes),
                },
            );
        }

        info!("All models loaded successfully");
        Ok(Self { models })
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredModel> {
        self.models.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Choose the model serving a request.
    ///
    /// Policy, in order: the requested name if registered; the latest
    /// retrained model; the configured fallback name.
    pub fn select(&self, requested: Option<&str>, fallback: &str) -> ServiceResult<(String, Arc<dyn Forecaster>)> {
        if let Some(name) = requested {
            if let Some(entry) = self.models.get(name) {
                info!("Using specified model: {}", name);
                return Ok((name.to_string(), Arc::clone(&entry.model)));
            }
            warn!("Requested model '{}' is not registered", name);
        }

        if let Some(name) = latest_retrained(self.names()) {
            info!("Using latest model: {}", name);
            let entry = &self.models[name];
            return Ok((name.to_string(), Arc::clone(&entry.model)));
        }

        info!("Using initial model: {}", fallback);
        self.models
            .get(fallback)
            .map(|entry| (fallback.to_string(), Arc::clone(&entry.model)))
            .ok_or_else(|| ServiceError::model_unavailable(format!("fallback model '{}' is not registered", fallback)))
    }

    /// Summaries of every registered model, ordered by name.
    pub fn list(&self) -> Vec<ModelSummary> {
        self.models
            .iter()
            .map(|(name, entry)| ModelSummary {
                name: name.clone(),
                model_type: entry.model.model_type().to_string(),
                order: entry.model.order().to_string(),
                seasonal_order: entry.model.seasonal_order().to_string(),
                n_obs: entry.model.nobs(),
                checksum: entry.checksum.clone(),
            })
            .collect()
    }
}
