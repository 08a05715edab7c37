//! # SARIMAX Forecast Server
//!
//! HTTP inference service for pre-trained SARIMAX demand forecasting models.
//!
//! Fitted models are loaded once at startup from a directory of JSON
//! artifacts. Each request selects a model, conforms the caller's exogenous
//! regressors to the trained feature layout, evaluates the forecast and
//! returns dated predictions on a daily, weekly, biweekly or monthly calendar.
//!
//! ## Architecture
//!
//! - [`config`]: Immutable server configuration (env + optional TOML file)
//! - [`registry`]: Model artifacts loaded into a read-only name → model map
//! - [`models`]: The [`models::Forecaster`] seam and the SARIMAX evaluator
//! - [`features`]: Exogenous feature alignment
//! - [`calendar`]: Forecast calendars and response assembly
//! - [`service`]: The request pipeline tying the pieces together
//! - [`http`]: Axum-based HTTP server and request handlers

pub mod calendar;
pub mod config;
pub mod error;
pub mod features;
pub mod models;
pub mod registry;
pub mod service;

#[cfg(feature = "http-server")]
pub mod http;

pub use error::{ServiceError, ServiceResult};
