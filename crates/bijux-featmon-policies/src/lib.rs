// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Monitor configuration: the YAML schema with its defaults, and the rule
//! table that rejects misconfiguration before any computation runs.

mod evaluation;
mod load;
mod schema;

pub use evaluation::{evaluate_config, ConfigSeverity, ConfigViolation};
pub use load::{
    canonical_config_json, config_sha256, load_config, parse_config_yaml, validate_config,
    ConfigError,
};
pub use schema::{
    AreaRule, ConfigSchemaVersion, CoverageConfig, MonitorConfig, SchemaDiffConfig,
    SnapshotGuardConfig, SourceToggle, SourcesConfig, DEFAULT_MAX_FIELDS_PER_TYPE,
    DEFAULT_MAX_UNFILTERED_TYPES, DEFAULT_MIN_FEATURES, DEFAULT_MIN_RATIO_OF_BASELINE,
    DEFAULT_THRESHOLD, DEFAULT_WARNING_THRESHOLD,
};

pub const CRATE_NAME: &str = "bijux-featmon-policies";
