// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use bijux_featmon_core::{ExitCode, MachineError};
use bijux_featmon_ingest::IngestError;
use bijux_featmon_model::ValidationError;
use bijux_featmon_policies::ConfigError;
use bijux_featmon_reconcile::DiffError;
use bijux_featmon_store::{StoreError, StoreErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("read input {path} failed: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("input {path} is not a valid batch: {source}")]
    Batch {
        path: PathBuf,
        #[source]
        source: IngestError,
    },
    #[error("decode {path} failed: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Diff(#[from] DiffError),
    #[error("invalid snapshot: {0}")]
    Model(#[from] ValidationError),
    #[error("encode output failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("coverage failed: {gap_areas} area(s) below threshold")]
    CoverageFailed { gap_areas: u64 },
}

impl PipelineError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Input { .. } => ExitCode::Usage,
            Self::Store(err) => match err.code {
                StoreErrorCode::Io => ExitCode::DependencyFailure,
                StoreErrorCode::Internal => ExitCode::Internal,
                _ => ExitCode::Validation,
            },
            Self::Encode(_) => ExitCode::Internal,
            Self::Config(_)
            | Self::Batch { .. }
            | Self::Decode { .. }
            | Self::Diff(_)
            | Self::Model(_)
            | Self::CoverageFailed { .. } => ExitCode::Validation,
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_invalid",
            Self::Store(err) => err.code.as_str(),
            Self::Input { .. } => "input_unreadable",
            Self::Batch { .. } => "input_invalid",
            Self::Decode { .. } => "decode_failed",
            Self::Model(_) => "snapshot_invalid",
            Self::Diff(DiffError::SuspiciousSnapshot { .. }) => "suspicious_snapshot",
            Self::Diff(_) => "diff_refused",
            Self::Encode(_) => "internal_error",
            Self::CoverageFailed { .. } => "coverage_failed",
        }
    }

    #[must_use]
    pub fn machine_error(&self) -> MachineError {
        let mut machine = MachineError::new(self.code(), &self.to_string());
        match self {
            Self::Input { path, .. }
            | Self::Batch { path, .. }
            | Self::Decode { path, .. } => {
                machine = machine.with_detail("path", &path.display().to_string());
            }
            Self::Diff(DiffError::SuspiciousSnapshot {
                current, baseline, ..
            }) => {
                machine = machine
                    .with_detail("current", &current.to_string())
                    .with_detail("baseline", &baseline.to_string());
            }
            _ => {}
        }
        machine
    }
}
