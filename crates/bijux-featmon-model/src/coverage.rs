// SPDX-License-Identifier: Apache-2.0

use crate::feature::{FeatureRecord, SourceType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const COVERAGE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum AreaStatus {
    Pass,
    Warning,
    Gap,
}

impl AreaStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Warning => "warning",
            Self::Gap => "gap",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum CoverageStatus {
    Pass,
    Warning,
    Fail,
}

impl CoverageStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Warning => "warning",
            Self::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AreaCoverage {
    pub area: String,
    pub total: u64,
    pub covered: u64,
    pub ratio: f64,
    pub threshold: f64,
    pub status: AreaStatus,
    pub high_priority: bool,
    pub newly_added: bool,
    /// Uncovered features when the area is a gap, else 0.
    pub gap_count: u64,
    pub high_impact_gap_count: u64,
}

impl AreaCoverage {
    #[must_use]
    pub fn is_gap(&self) -> bool {
        self.status == AreaStatus::Gap
    }

    #[must_use]
    pub fn is_high_impact_gap(&self) -> bool {
        self.is_gap() && (self.high_priority || self.newly_added)
    }

    #[must_use]
    pub fn uncovered(&self) -> u64 {
        self.total.saturating_sub(self.covered)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoverageTotals {
    pub total_features: u64,
    pub covered: u64,
    pub ratio: f64,
    pub area_count: u64,
    pub gap_areas: u64,
    pub high_impact_gap_areas: u64,
    pub gap_count: u64,
    pub high_impact_gap_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoverageReport {
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    pub snapshot_generated_at: DateTime<Utc>,
    pub status: CoverageStatus,
    pub areas: Vec<AreaCoverage>,
    pub by_source: BTreeMap<SourceType, u64>,
    pub totals: CoverageTotals,
}

impl CoverageReport {
    #[must_use]
    pub fn area(&self, name: &str) -> Option<&AreaCoverage> {
        self.areas.iter().find(|a| a.area == name)
    }
}

/// Declaration order drives sorting: high-severity findings come first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum GapSeverity {
    High,
    Medium,
}

impl GapSeverity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GapFinding {
    pub area: String,
    pub severity: GapSeverity,
    pub ratio: f64,
    pub threshold: f64,
    pub uncovered: u64,
    pub added_features: Vec<FeatureRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GapFindings {
    pub generated_at: DateTime<Utc>,
    pub gaps: Vec<GapFinding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GapDelta {
    pub old_total: u64,
    pub new_total: u64,
    pub old_high: u64,
    pub new_high: u64,
}

impl GapDelta {
    #[must_use]
    pub fn total_change(&self) -> i64 {
        self.new_total as i64 - self.old_total as i64
    }

    #[must_use]
    pub fn high_change(&self) -> i64 {
        self.new_high as i64 - self.old_high as i64
    }
}
