//! Configuration resolution from the process environment and config files.

mod support;

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use sarimax_serve::config::ServerConfig;
use sarimax_serve::error::ServiceError;
use support::with_scoped_env;

const VARS: [&str; 6] = ["SARIMAX_CONFIG", "MODEL_PATH", "HOST", "PORT", "DEFAULT_MODEL", "MAX_STEPS"];

/// Every config variable cleared, then `set` applied on top.
fn env<'a>(set: &[(&'a str, &'a str)]) -> Vec<(&'a str, Option<&'a str>)> {
    let mut changes: Vec<(&str, Option<&str>)> = VARS.iter().map(|k| (*k, None)).collect();
    changes.extend(set.iter().map(|(k, v)| (*k, Some(*v))));
    changes
}

#[test]
fn test_env_variables_override_defaults() {
    let config = with_scoped_env(
        &env(&[
            ("MODEL_PATH", "/srv/models"),
            ("PORT", "9100"),
            ("DEFAULT_MODEL", "baseline"),
            ("MAX_STEPS", "365"),
        ]),
        ServerConfig::load,
    )
    .unwrap();

    assert_eq!(config.model_dir, PathBuf::from("/srv/models"));
    assert_eq!(config.port, 9100);
    assert_eq!(config.default_model, "baseline");
    assert_eq!(config.max_steps, 365);
    assert_eq!(config.host, "0.0.0.0");
}

#[test]
fn test_config_file_then_env() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sarimax.toml");
    fs::write(
        &path,
        r#"
        [server]
        host = "127.0.0.1"
        port = 7000

        [models]
        path = "/data/models"
        default_model = "from_file"
        "#,
    )
    .unwrap();
    let path = path.to_string_lossy().into_owned();

    let config = with_scoped_env(&env(&[("SARIMAX_CONFIG", path.as_str()), ("PORT", "7001")]), ServerConfig::load).unwrap();

    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 7001);
    assert_eq!(config.model_dir, PathBuf::from("/data/models"));
    assert_eq!(config.default_model, "from_file");
}

#[test]
fn test_missing_config_file_is_error() {
    let err = with_scoped_env(
        &env(&[("SARIMAX_CONFIG", "/definitely/not/here/sarimax.toml")]),
        ServerConfig::load,
    )
    .unwrap_err();
    assert!(matches!(err, ServiceError::Config(_)));
}

#[test]
fn test_invalid_values_are_rejected() {
    for (key, value) in [("PORT", "70000"), ("MAX_STEPS", "-1"), ("MAX_STEPS", "0")] {
        let result = with_scoped_env(&env(&[(key, value)]), ServerConfig::load);
        assert!(result.is_err(), "{}={} should be rejected", key, value);
    }
}
