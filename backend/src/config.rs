//! Server configuration.
//!
//! Settings resolve in three layers: built-in defaults, an optional TOML file,
//! then environment variables. The result is an immutable [`ServerConfig`]
//! built once at startup and handed to the service.
//!
//! # Environment Variables
//! - `MODEL_PATH`: directory holding model artifacts (default: `/app/models`)
//! - `HOST`: bind address (default: `0.0.0.0`)
//! - `PORT`: listen port (default: `9001`)
//! - `DEFAULT_MODEL`: model used when no retrained model exists
//!   (default: `sarimax_initial_18months`)
//! - `MAX_STEPS`: largest accepted forecast horizon (default: `3650`)
//! - `SARIMAX_CONFIG`: path to a TOML configuration file
//!
//! # Configuration File
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 9001
//!
//! [models]
//! path = "/app/models"
//! extension = "json"
//! default_model = "sarimax_initial_18months"
//!
//! [forecast]
//! max_steps = 3650
//! exog_features = ["gcv_cal_value_lag_1", "..."]
//! ```

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};
use crate::features::default_exog_features;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9001;
pub const DEFAULT_MODEL_DIR: &str = "/app/models";
pub const DEFAULT_MODEL_EXTENSION: &str = "json";
pub const DEFAULT_MODEL_NAME: &str = "sarimax_initial_18months";
pub const DEFAULT_MAX_STEPS: usize = 3650;

/// Resolved configuration for the forecast server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory scanned for model artifacts at startup
    pub model_dir: PathBuf,
    /// File extension of model artifacts, without the dot
    pub model_extension: String,
    /// Model served when neither the requested nor a retrained model exists
    pub default_model: String,
    /// Upper bound on `steps` for a single forecast
    pub max_steps: usize,
    /// Exogenous feature layout the models were trained with
    pub exog_features: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            model_extension: DEFAULT_MODEL_EXTENSION.to_string(),
            default_model: DEFAULT_MODEL_NAME.to_string(),
            max_steps: DEFAULT_MAX_STEPS,
            exog_features: default_exog_features(),
        }
    }
}

/// On-disk configuration file. Every setting is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub models: ModelsSection,
    #[serde(default)]
    pub forecast: ForecastSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelsSection {
    pub path: Option<PathBuf>,
    pub extension: Option<String>,
    pub default_model: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastSection {
    pub max_steps: Option<usize>,
    pub exog_features: Option<Vec<String>>,
}

impl ConfigFile {
    /// Load a configuration file from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ServiceResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ServiceError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| ServiceError::config(format!("{} ({})", e.message(), path.display())))
    }

    pub fn from_toml_str(content: &str) -> ServiceResult<Self> {
        toml::from_str(content)
            .map_err(|e| ServiceError::config(format!("Failed to parse config file: {}", e)))
    }

    /// Find a configuration file in the standard locations.
    ///
    /// Searches for `sarimax.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    pub fn find_default_location() -> Option<PathBuf> {
        [PathBuf::from("sarimax.toml"), PathBuf::from("backend/sarimax.toml")]
            .into_iter()
            .find(|p| p.exists())
    }
}

impl ServerConfig {
    /// Resolve configuration from the process environment and, if present,
    /// the configuration file.
    pub fn load() -> ServiceResult<Self> {
        let file = match env::var("SARIMAX_CONFIG") {
            Ok(path) => Some(ConfigFile::from_file(path)?),
            Err(_) => ConfigFile::find_default_location()
                .map(|path| ConfigFile::from_file(&path))
                .transpose()?,
        };

        let mut config = Self::default();
        if let Some(file) = file {
            config.apply_file(file);
        }
        config.apply_env(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay settings present in a configuration file.
    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(host) = file.server.host {
            self.host = host;
        }
        if let Some(port) = file.server.port {
            self.port = port;
        }
        if let Some(path) = file.models.path {
            self.model_dir = path;
        }
        if let Some(ext) = file.models.extension {
            self.model_extension = ext.trim_start_matches('.').to_string();
        }
        if let Some(name) = file.models.default_model {
            self.default_model = name;
        }
        if let Some(max_steps) = file.forecast.max_steps {
            self.max_steps = max_steps;
        }
        if let Some(features) = file.forecast.exog_features {
            self.exog_features = features;
        }
    }

    /// Overlay settings from environment-style lookups.
    pub fn apply_env<F>(&mut self, lookup: F) -> ServiceResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("MODEL_PATH") {
            self.model_dir = PathBuf::from(path);
        }
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = port
                .parse()
                .map_err(|_| ServiceError::config(format!("PORT must be a valid port number, got '{}'", port)))?;
        }
        if let Some(name) = lookup("DEFAULT_MODEL") {
            self.default_model = name;
        }
        if let Some(max_steps) = lookup("MAX_STEPS") {
            self.max_steps = max_steps
                .parse()
                .map_err(|_| ServiceError::config(format!("MAX_STEPS must be a positive integer, got '{}'", max_steps)))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> ServiceResult<()> {
        if self.max_steps == 0 {
            return Err(ServiceError::config("max_steps must be at least 1"));
        }
        if self.exog_features.is_empty() {
            return Err(ServiceError::config("exog_features must not be empty"));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.exog_features.iter().find(|f| !seen.insert(f.as_str())) {
            return Err(ServiceError::config(format!("duplicate exogenous feature '{}'", dup)));
        }
        if self.model_extension.is_empty() {
            return Err(ServiceError::config("model extension must not be empty"));
        }
        Ok(())
    }

    /// `host:port` string suitable for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
