// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Shared contracts for the feature monitor workspace: canonical JSON,
//! sha256 helpers, process exit codes, and config path resolution.

pub mod canonical;
mod config;
mod errors;

pub use canonical::{sha256_hex, stable_json_bytes, stable_json_hash_hex};
pub use config::{resolve_config_path, resolve_store_root, DEFAULT_CONFIG_PATH, DEFAULT_STORE_ROOT};
pub use errors::{ExitCode, MachineError};

pub const CRATE_NAME: &str = "bijux-featmon-core";

pub const ENV_FEATMON_CONFIG_PATH: &str = "FEATMON_CONFIG_PATH";
pub const ENV_FEATMON_STORE_ROOT: &str = "FEATMON_STORE_ROOT";
pub const ENV_FEATMON_LOG_JSON: &str = "FEATMON_LOG_JSON";
