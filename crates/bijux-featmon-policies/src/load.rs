// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::{Path, PathBuf};

use bijux_featmon_core::{sha256_hex, stable_json_bytes};
use thiserror::Error;

use crate::evaluation::{evaluate_config, ConfigSeverity, ConfigViolation};
use crate::schema::MonitorConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path} failed: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config failed: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(ConfigViolation),
    #[error("encode config failed: {0}")]
    Encode(#[from] serde_json::Error),
}

pub fn load_config(path: &Path) -> Result<MonitorConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_yaml(&raw)
}

/// Decodes and validates YAML. An empty document yields the defaults.
pub fn parse_config_yaml(raw: &str) -> Result<MonitorConfig, ConfigError> {
    let config: MonitorConfig = if raw.trim().is_empty() {
        MonitorConfig::default()
    } else {
        serde_yaml::from_str(raw)?
    };
    validate_config(&config)?;
    Ok(config)
}

/// Fails on the first error-severity violation and returns the warnings otherwise.
pub fn validate_config(config: &MonitorConfig) -> Result<Vec<ConfigViolation>, ConfigError> {
    let violations = evaluate_config(config);
    if let Some(v) = violations
        .iter()
        .find(|v| matches!(v.severity, ConfigSeverity::Error))
    {
        return Err(ConfigError::Invalid(v.clone()));
    }
    Ok(violations)
}

pub fn canonical_config_json(config: &MonitorConfig) -> Result<String, ConfigError> {
    let bytes = stable_json_bytes(config)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn config_sha256(config: &MonitorConfig) -> Result<String, ConfigError> {
    Ok(sha256_hex(&stable_json_bytes(config)?))
}
