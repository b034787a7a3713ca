// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bijux_featmon_ingest::{
    decode_batch, detect_schema_changes, normalize, normalize_values, schema_changes_as_raw,
    AreaClassifier, NormalizeContext, NormalizeOutcome,
};
use bijux_featmon_model::{
    CoverageReport, CoverageStatus, DiffCounts, FeatureRecord, GapDelta, GapFinding, Snapshot,
    SnapshotId, SourceType,
};
use bijux_featmon_policies::MonitorConfig;
use bijux_featmon_reconcile::{diff, evaluate, gap_delta, gap_findings, reconcile, DiffOptions};
use bijux_featmon_store::{LocalFsStore, ReportKind, SnapshotRef, SnapshotStore};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::PipelineError;

/// Raw inputs for one monitoring run. Missing paths mean the source produced
/// nothing this run.
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub changelog: Option<PathBuf>,
    pub roadmap: Option<PathBuf>,
    pub schema: Option<PathBuf>,
    pub observed_at: DateTime<Utc>,
    /// Persist an empty result as an intentional empty state.
    pub explicit_empty: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub observed_at: DateTime<Utc>,
    pub snapshot_id: SnapshotId,
    pub saved: Option<SnapshotRef>,
    pub features: u64,
    pub duplicates: u64,
    pub carried_forward: u64,
    pub rejected: BTreeMap<SourceType, u64>,
    pub skipped_sources: Vec<SourceType>,
    pub schema_changes: u64,
    pub diff: DiffCounts,
    pub coverage_status: CoverageStatus,
    pub gap_delta: GapDelta,
    pub gaps: Vec<GapFinding>,
}

pub(crate) fn read_input(path: &Path) -> Result<String, PipelineError> {
    fs::read_to_string(path).map_err(|source| PipelineError::Input {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn read_json_file<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<T, PipelineError> {
    let raw = read_input(path)?;
    serde_json::from_str(&raw).map_err(|source| PipelineError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn normalize_file(
    path: &Path,
    source: SourceType,
    ctx: &NormalizeContext<'_>,
) -> Result<NormalizeOutcome, PipelineError> {
    let raw = read_input(path)?;
    let batch = decode_batch(&raw).map_err(|source| PipelineError::Batch {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(normalize_values(batch, source, ctx))
}

struct Collected {
    batches: Vec<Vec<FeatureRecord>>,
    rejected: BTreeMap<SourceType, u64>,
    skipped: Vec<SourceType>,
    schema_changes: u64,
    schema_sdl: Option<String>,
}

fn collect_batches(
    config: &MonitorConfig,
    store: &LocalFsStore,
    previous: Option<&Snapshot>,
    inputs: &RunInputs,
) -> Result<Collected, PipelineError> {
    let classifier = AreaClassifier::new(config.areas.clone());
    let ctx = NormalizeContext {
        observed_at: inputs.observed_at,
        classifier: &classifier,
    };
    let mut collected = Collected {
        batches: Vec::new(),
        rejected: BTreeMap::new(),
        skipped: Vec::new(),
        schema_changes: 0,
        schema_sdl: None,
    };

    for (source, path) in [
        (SourceType::Changelog, &inputs.changelog),
        (SourceType::Roadmap, &inputs.roadmap),
    ] {
        let Some(path) = path else { continue };
        if !config.sources.is_enabled(source) {
            tracing::info!(source = source.as_str(), "source disabled; input ignored");
            collected.skipped.push(source);
            continue;
        }
        let outcome = normalize_file(path, source, &ctx)?;
        collected
            .rejected
            .insert(source, outcome.rejected.len() as u64);
        collected.batches.push(outcome.records);
    }

    let schema_source = SourceType::GraphqlSchemaDiff;
    if !config.sources.is_enabled(schema_source) {
        if inputs.schema.is_some() {
            tracing::info!(source = schema_source.as_str(), "source disabled; input ignored");
            collected.skipped.push(schema_source);
        }
        return Ok(collected);
    }
    if let Some(path) = &inputs.schema {
        let sdl = read_input(path)?;
        let date = inputs.observed_at.date_naive();
        let changes = match store.previous_schema_snapshot(date)? {
            Some((previous_date, old_sdl)) => {
                tracing::info!(%previous_date, "diffing schema against earlier snapshot");
                detect_schema_changes(&old_sdl, &sdl, &config.schema_diff)
            }
            None => {
                tracing::info!("no earlier schema snapshot; recording baseline only");
                Vec::new()
            }
        };
        collected.schema_changes = changes.len() as u64;
        let outcome = normalize(schema_changes_as_raw(changes), schema_source, &ctx);
        collected
            .rejected
            .insert(schema_source, outcome.rejected.len() as u64);
        collected.batches.push(outcome.records);
        collected.schema_sdl = Some(sdl);
    }
    // Schema additions stay known after the run that detected them.
    if let Some(previous) = previous {
        let retained: Vec<FeatureRecord> = previous
            .features()
            .iter()
            .filter(|f| f.source_type == schema_source)
            .cloned()
            .collect();
        collected.batches.push(retained);
    }
    Ok(collected)
}

/// Full monitoring pass: normalize, merge, diff, score, then persist.
///
/// A suspicious snapshot stops the run before anything is written, so the
/// previous `LATEST` stays the baseline for the next attempt.
pub fn run_pipeline(
    config: &MonitorConfig,
    store: &LocalFsStore,
    inputs: &RunInputs,
) -> Result<RunSummary, PipelineError> {
    let span = tracing::info_span!("pipeline.run", observed_at = %inputs.observed_at);
    let _guard = span.enter();

    let previous = store.load_previous()?;
    let collected = collect_batches(config, store, previous.as_ref(), inputs)?;
    let merge = reconcile(previous.as_ref(), collected.batches, inputs.observed_at)?;
    let current = if merge.snapshot.is_empty() && inputs.explicit_empty {
        Snapshot::explicit_empty(inputs.observed_at)
    } else {
        merge.snapshot
    };

    let diff_result = diff(
        previous.as_ref(),
        &current,
        &DiffOptions::from(&config.snapshot_guard),
    )?;
    let previous_report: Option<CoverageReport> =
        store.read_latest_report(ReportKind::Coverage)?;
    let coverage = evaluate(&current, &config.coverage, previous_report.as_ref());
    let findings = gap_findings(Some(&diff_result), &coverage);
    let delta = gap_delta(previous_report.as_ref(), &coverage);

    let mut saved = None;
    if inputs.dry_run {
        tracing::info!("dry run; nothing persisted");
    } else {
        if current.is_empty() && !current.is_explicit_empty() {
            tracing::warn!("no features collected; snapshot not persisted");
        } else {
            let receipt = store.save(&current)?;
            let id = &receipt.snapshot.snapshot_id;
            store.write_report(ReportKind::Diff, id, &diff_result)?;
            store.write_report(ReportKind::Coverage, id, &coverage)?;
            store.write_report(ReportKind::Gaps, id, &findings)?;
            saved = Some(receipt.snapshot);
        }
        if let Some(sdl) = &collected.schema_sdl {
            store.save_schema_snapshot(inputs.observed_at.date_naive(), sdl)?;
        }
    }

    tracing::info!(
        features = current.len(),
        added = diff_result.counts.added,
        removed = diff_result.counts.removed,
        changed = diff_result.counts.changed,
        coverage = coverage.status.as_str(),
        "run complete"
    );
    Ok(RunSummary {
        observed_at: inputs.observed_at,
        snapshot_id: current.id(),
        saved,
        features: current.len() as u64,
        duplicates: merge.duplicates.len() as u64,
        carried_forward: merge.carried_forward,
        rejected: collected.rejected,
        skipped_sources: collected.skipped,
        schema_changes: collected.schema_changes,
        diff: diff_result.counts,
        coverage_status: coverage.status,
        gap_delta: delta,
        gaps: findings.gaps,
    })
}
