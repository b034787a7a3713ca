// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use bijux_featmon_model::{
    CoverageReport, DiffResult, FeatureRecord, GapDelta, GapFinding, GapFindings, GapSeverity,
};

/// One finding per gap area, high severity first, then by area name.
///
/// `added_features` carries the records `diff` added in that area, so a
/// tracking issue can name and link what arrived uncovered.
#[must_use]
pub fn gap_findings(diff: Option<&DiffResult>, report: &CoverageReport) -> GapFindings {
    let mut added_by_area: BTreeMap<&str, Vec<FeatureRecord>> = BTreeMap::new();
    for record in diff.map(|d| d.added.as_slice()).unwrap_or_default() {
        added_by_area
            .entry(record.product_area.as_str())
            .or_default()
            .push(record.clone());
    }

    let mut gaps: Vec<GapFinding> = report
        .areas
        .iter()
        .filter(|area| area.is_gap())
        .map(|area| GapFinding {
            area: area.area.clone(),
            severity: if area.is_high_impact_gap() {
                GapSeverity::High
            } else {
                GapSeverity::Medium
            },
            ratio: area.ratio,
            threshold: area.threshold,
            uncovered: area.uncovered(),
            added_features: added_by_area
                .remove(area.area.as_str())
                .unwrap_or_default(),
        })
        .collect();
    gaps.sort_by(|a, b| a.severity.cmp(&b.severity).then_with(|| a.area.cmp(&b.area)));

    GapFindings {
        generated_at: report.generated_at,
        gaps,
    }
}

/// Gap-area totals before and after, for the executive summary.
#[must_use]
pub fn gap_delta(previous: Option<&CoverageReport>, current: &CoverageReport) -> GapDelta {
    let (old_total, old_high) = previous.map_or((0, 0), |p| {
        (p.totals.gap_areas, p.totals.high_impact_gap_areas)
    });
    GapDelta {
        old_total,
        new_total: current.totals.gap_areas,
        old_high,
        new_high: current.totals.high_impact_gap_areas,
    }
}
