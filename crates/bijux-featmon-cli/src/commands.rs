// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use bijux_featmon_core::{resolve_config_path, stable_json_bytes, ENV_FEATMON_CONFIG_PATH};
use bijux_featmon_ingest::{detect_schema_changes, AreaClassifier, NormalizeContext};
use bijux_featmon_model::{CoverageReport, CoverageStatus, Snapshot, SourceType};
use bijux_featmon_policies::{
    canonical_config_json, config_sha256, load_config, validate_config, MonitorConfig,
};
use bijux_featmon_reconcile::{diff, evaluate, DiffOptions};
use bijux_featmon_store::{LocalFsStore, SnapshotStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::error::PipelineError;
use crate::pipeline::{normalize_file, read_input, read_json_file, run_pipeline, RunInputs};
use crate::OutputMode;

pub(crate) fn emit_ok<T: Serialize>(
    output_mode: OutputMode,
    payload: &T,
) -> Result<(), PipelineError> {
    if output_mode.json {
        let bytes = stable_json_bytes(payload)?;
        println!("{}", String::from_utf8_lossy(&bytes));
    } else {
        println!("{}", serde_json::to_string_pretty(payload)?);
    }
    Ok(())
}

/// Loads the resolved config. The built-in defaults apply only when no path
/// was requested and the workspace default file is absent.
pub(crate) fn load_monitor_config(
    explicit: Option<&Path>,
) -> Result<(PathBuf, MonitorConfig), PipelineError> {
    let path = resolve_config_path(explicit);
    let requested = explicit.is_some() || std::env::var_os(ENV_FEATMON_CONFIG_PATH).is_some();
    if !requested && !path.exists() {
        tracing::info!(path = %path.display(), "config file absent; using defaults");
        return Ok((path, MonitorConfig::default()));
    }
    let config = load_config(&path)?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok((path, config))
}

pub(crate) fn run_normalize(
    config: &MonitorConfig,
    source: SourceType,
    input: &Path,
    observed_at: DateTime<Utc>,
    output_mode: OutputMode,
) -> Result<(), PipelineError> {
    let classifier = AreaClassifier::new(config.areas.clone());
    let ctx = NormalizeContext {
        observed_at,
        classifier: &classifier,
    };
    let outcome = normalize_file(input, source, &ctx)?;
    emit_ok(output_mode, &outcome)
}

pub(crate) fn run_schema_diff(
    config: &MonitorConfig,
    old: &Path,
    new: &Path,
    output_mode: OutputMode,
) -> Result<(), PipelineError> {
    let old_sdl = read_input(old)?;
    let new_sdl = read_input(new)?;
    let changes = detect_schema_changes(&old_sdl, &new_sdl, &config.schema_diff);
    emit_ok(
        output_mode,
        &json!({
            "command": "schema-diff",
            "count": changes.len(),
            "changes": changes,
        }),
    )
}

pub(crate) fn run_diff(
    config: &MonitorConfig,
    baseline: Option<&Path>,
    current: &Path,
    output_mode: OutputMode,
) -> Result<(), PipelineError> {
    let baseline: Option<Snapshot> = baseline.map(read_json_file).transpose()?;
    let current: Snapshot = read_json_file(current)?;
    let result = diff(
        baseline.as_ref(),
        &current,
        &DiffOptions::from(&config.snapshot_guard),
    )?;
    emit_ok(output_mode, &result)
}

pub(crate) fn run_coverage(
    config: &MonitorConfig,
    snapshot: &Path,
    previous: Option<&Path>,
    strict: bool,
    output_mode: OutputMode,
) -> Result<(), PipelineError> {
    let current: Snapshot = read_json_file(snapshot)?;
    let previous: Option<CoverageReport> = previous.map(read_json_file).transpose()?;
    let report = evaluate(&current, &config.coverage, previous.as_ref());
    emit_ok(output_mode, &report)?;
    fail_on_gaps(strict, report.status, report.totals.gap_areas)
}

pub(crate) fn run_monitor(
    config: &MonitorConfig,
    store: &LocalFsStore,
    inputs: &RunInputs,
    strict: bool,
    output_mode: OutputMode,
) -> Result<(), PipelineError> {
    let summary = run_pipeline(config, store, inputs)?;
    emit_ok(output_mode, &summary)?;
    fail_on_gaps(strict, summary.coverage_status, summary.gap_delta.new_total)
}

fn fail_on_gaps(
    strict: bool,
    status: CoverageStatus,
    gap_areas: u64,
) -> Result<(), PipelineError> {
    if strict && status == CoverageStatus::Fail {
        return Err(PipelineError::CoverageFailed { gap_areas });
    }
    Ok(())
}

pub(crate) fn run_store_latest(
    store: &LocalFsStore,
    output_mode: OutputMode,
) -> Result<(), PipelineError> {
    let pointer = store.latest_pointer()?;
    emit_ok(
        output_mode,
        &json!({
            "root": store.root,
            "latest": pointer,
        }),
    )
}

pub(crate) fn run_store_list(
    store: &LocalFsStore,
    output_mode: OutputMode,
) -> Result<(), PipelineError> {
    let snapshots = store.list_snapshots()?;
    emit_ok(
        output_mode,
        &json!({
            "root": store.root,
            "snapshots": snapshots,
        }),
    )
}

pub(crate) fn run_store_unlock(
    store: &LocalFsStore,
    output_mode: OutputMode,
) -> Result<(), PipelineError> {
    let outcome = store.break_publish_lock()?;
    emit_ok(
        output_mode,
        &json!({
            "root": store.root,
            "removed": outcome.removed,
            "holder": outcome.holder,
        }),
    )
}

pub(crate) fn run_config_validate(
    path: &Path,
    config: &MonitorConfig,
    output_mode: OutputMode,
) -> Result<(), PipelineError> {
    let warnings = validate_config(config)?;
    for warning in &warnings {
        tracing::warn!(id = warning.id, evidence = %warning.evidence, "{}", warning.message);
    }
    emit_ok(
        output_mode,
        &json!({
            "command": "config validate",
            "status": "ok",
            "path": path,
            "sha256": config_sha256(config)?,
            "warnings": warnings,
        }),
    )
}

pub(crate) fn run_config_print(config: &MonitorConfig) -> Result<(), PipelineError> {
    println!("{}", canonical_config_json(config)?);
    Ok(())
}
