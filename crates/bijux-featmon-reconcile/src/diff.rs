// SPDX-License-Identifier: Apache-2.0

use bijux_featmon_model::{
    ChangedFeature, DiffCounts, DiffResult, Snapshot, TrackedField, DIFF_SCHEMA_VERSION,
};
use bijux_featmon_policies::{
    SnapshotGuardConfig, DEFAULT_MIN_FEATURES, DEFAULT_MIN_RATIO_OF_BASELINE,
};
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum DiffError {
    /// The current snapshot shrank past the guard; a partial ingestion is the
    /// likely cause, so no diff is produced.
    #[error(
        "suspicious snapshot: {current} features against a baseline of {baseline} \
         (min_features={min_features}, min_ratio_of_baseline={min_ratio_of_baseline})"
    )]
    SuspiciousSnapshot {
        current: u64,
        baseline: u64,
        min_features: u64,
        min_ratio_of_baseline: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffOptions {
    pub min_features: u64,
    pub min_ratio_of_baseline: f64,
    /// Defaults to the current snapshot's timestamp.
    pub generated_at: Option<DateTime<Utc>>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            min_features: DEFAULT_MIN_FEATURES,
            min_ratio_of_baseline: DEFAULT_MIN_RATIO_OF_BASELINE,
            generated_at: None,
        }
    }
}

impl From<&SnapshotGuardConfig> for DiffOptions {
    fn from(guard: &SnapshotGuardConfig) -> Self {
        Self {
            min_features: guard.min_features,
            min_ratio_of_baseline: guard.min_ratio_of_baseline,
            generated_at: None,
        }
    }
}

fn check_guard(
    baseline: &Snapshot,
    current: &Snapshot,
    options: &DiffOptions,
) -> Result<(), DiffError> {
    if baseline.is_empty() || current.is_explicit_empty() {
        return Ok(());
    }
    let current_len = current.len() as u64;
    let baseline_len = baseline.len() as u64;
    let below_floor = current_len < options.min_features;
    let below_ratio = (current_len as f64) < options.min_ratio_of_baseline * baseline_len as f64;
    if below_floor || below_ratio {
        tracing::warn!(
            current = current_len,
            baseline = baseline_len,
            min_features = options.min_features,
            min_ratio_of_baseline = options.min_ratio_of_baseline,
            "refusing to diff suspicious snapshot"
        );
        return Err(DiffError::SuspiciousSnapshot {
            current: current_len,
            baseline: baseline_len,
            min_features: options.min_features,
            min_ratio_of_baseline: options.min_ratio_of_baseline,
        });
    }
    Ok(())
}

/// Classifies every key as added, removed, or changed between two snapshots.
///
/// `None` is the empty first-run baseline. Output lists follow key order, and
/// keys equal on every tracked field appear nowhere.
pub fn diff(
    baseline: Option<&Snapshot>,
    current: &Snapshot,
    options: &DiffOptions,
) -> Result<DiffResult, DiffError> {
    if let Some(baseline) = baseline {
        check_guard(baseline, current, options)?;
    }
    let old = baseline.map(Snapshot::features).unwrap_or_default();
    let new = current.features();

    let mut added = Vec::new();
    let mut removed = Vec::new();
    let mut changed = Vec::new();

    // Both sides are sorted by key, so a single merge pass classifies everything.
    let (mut i, mut j) = (0, 0);
    while i < old.len() || j < new.len() {
        match (old.get(i), new.get(j)) {
            (Some(o), Some(n)) if o.key == n.key => {
                let fields: Vec<TrackedField> = TrackedField::ALL
                    .into_iter()
                    .filter(|field| field.differs(o, n))
                    .collect();
                if !fields.is_empty() {
                    changed.push(ChangedFeature {
                        key: n.key.clone(),
                        fields,
                        old: o.clone(),
                        new: n.clone(),
                    });
                }
                i += 1;
                j += 1;
            }
            (Some(o), Some(n)) if o.key < n.key => {
                removed.push(o.clone());
                i += 1;
            }
            (_, Some(n)) => {
                added.push(n.clone());
                j += 1;
            }
            (Some(o), None) => {
                removed.push(o.clone());
                i += 1;
            }
            (None, None) => break,
        }
    }

    let counts = DiffCounts {
        total_old: old.len() as u64,
        total_new: new.len() as u64,
        added: added.len() as u64,
        removed: removed.len() as u64,
        changed: changed.len() as u64,
    };
    tracing::info!(
        added = counts.added,
        removed = counts.removed,
        changed = counts.changed,
        "diff computed"
    );
    Ok(DiffResult {
        schema_version: DIFF_SCHEMA_VERSION,
        generated_at: options.generated_at.unwrap_or_else(|| current.generated_at()),
        baseline_generated_at: baseline.map(Snapshot::generated_at),
        current_generated_at: current.generated_at(),
        counts,
        added,
        removed,
        changed,
    })
}
