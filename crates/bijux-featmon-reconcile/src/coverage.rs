// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use bijux_featmon_model::{
    AreaCoverage, AreaStatus, CoverageReport, CoverageStatus, CoverageTotals, Snapshot,
    SourceType, COVERAGE_SCHEMA_VERSION,
};
use bijux_featmon_policies::CoverageConfig;

#[derive(Default)]
struct Tally {
    total: u64,
    covered: u64,
}

fn ratio(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    }
}

fn area_status(total: u64, ratio: f64, threshold: f64, warning_threshold: f64) -> AreaStatus {
    if total == 0 {
        AreaStatus::Pass
    } else if ratio < threshold {
        AreaStatus::Gap
    } else if ratio < warning_threshold {
        AreaStatus::Warning
    } else {
        AreaStatus::Pass
    }
}

fn newly_added(area: &str, total: u64, previous: Option<&CoverageReport>) -> bool {
    match previous {
        Some(prior) if total > 0 => prior.area(area).map_or(true, |a| a.total == 0),
        _ => false,
    }
}

/// Scores `current` per product area against the configured thresholds.
///
/// `previous` is only consulted to flag areas that appeared since the last
/// report; without one, no area counts as newly added.
#[must_use]
pub fn evaluate(
    current: &Snapshot,
    config: &CoverageConfig,
    previous: Option<&CoverageReport>,
) -> CoverageReport {
    let mut tallies: BTreeMap<&str, Tally> = config
        .configured_areas()
        .into_iter()
        .map(|area| (area, Tally::default()))
        .collect();
    let mut by_source: BTreeMap<SourceType, u64> =
        SourceType::ALL.into_iter().map(|s| (s, 0)).collect();

    for feature in current.features() {
        let tally = tallies.entry(feature.product_area.as_str()).or_default();
        tally.total += 1;
        if config.is_covered(feature.status) {
            tally.covered += 1;
        }
        *by_source.entry(feature.source_type).or_default() += 1;
    }

    let mut totals = CoverageTotals::default();
    let areas: Vec<AreaCoverage> = tallies
        .into_iter()
        .map(|(area, tally)| {
            let ratio = ratio(tally.covered, tally.total);
            let threshold = config.threshold_for(area);
            let status = area_status(tally.total, ratio, threshold, config.warning_threshold);
            let mut entry = AreaCoverage {
                area: area.to_string(),
                total: tally.total,
                covered: tally.covered,
                ratio,
                threshold,
                status,
                high_priority: config.is_high_priority(area),
                newly_added: newly_added(area, tally.total, previous),
                gap_count: 0,
                high_impact_gap_count: 0,
            };
            if entry.is_gap() {
                entry.gap_count = entry.uncovered();
                totals.gap_areas += 1;
                totals.gap_count += entry.gap_count;
                if entry.is_high_impact_gap() {
                    entry.high_impact_gap_count = entry.gap_count;
                    totals.high_impact_gap_areas += 1;
                    totals.high_impact_gap_count += entry.gap_count;
                }
            }
            totals.total_features += entry.total;
            totals.covered += entry.covered;
            entry
        })
        .collect();
    totals.area_count = areas.len() as u64;
    totals.ratio = ratio(totals.covered, totals.total_features);

    let status = if totals.gap_areas > 0 {
        CoverageStatus::Fail
    } else if areas.iter().any(|a| a.status == AreaStatus::Warning) {
        CoverageStatus::Warning
    } else {
        CoverageStatus::Pass
    };
    tracing::info!(
        areas = totals.area_count,
        gap_areas = totals.gap_areas,
        high_impact_gap_areas = totals.high_impact_gap_areas,
        status = status.as_str(),
        "coverage evaluated"
    );

    CoverageReport {
        schema_version: COVERAGE_SCHEMA_VERSION,
        generated_at: current.generated_at(),
        snapshot_generated_at: current.generated_at(),
        status,
        areas,
        by_source,
        totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_bands_follow_thresholds() {
        assert_eq!(area_status(0, 0.0, 0.7, 0.85), AreaStatus::Pass);
        assert_eq!(area_status(10, 0.3, 0.5, 0.85), AreaStatus::Gap);
        assert_eq!(area_status(10, 0.8, 0.7, 0.85), AreaStatus::Warning);
        assert_eq!(area_status(10, 0.9, 0.7, 0.85), AreaStatus::Pass);
        assert_eq!(area_status(10, 0.9, 0.95, 0.85), AreaStatus::Gap);
    }

    #[test]
    fn ratio_of_empty_area_is_zero() {
        assert_eq!(ratio(0, 0), 0.0);
        assert_eq!(ratio(3, 10), 0.3);
    }
}
