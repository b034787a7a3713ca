// SPDX-License-Identifier: Apache-2.0

use bijux_featmon_model::{FeatureStatus, SourceType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_THRESHOLD: f64 = 0.7;
pub const DEFAULT_WARNING_THRESHOLD: f64 = 0.85;
pub const DEFAULT_MIN_FEATURES: u64 = 1;
pub const DEFAULT_MIN_RATIO_OF_BASELINE: f64 = 0.5;
pub const DEFAULT_MAX_FIELDS_PER_TYPE: usize = 5;
pub const DEFAULT_MAX_UNFILTERED_TYPES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ConfigSchemaVersion {
    #[default]
    #[serde(rename = "1")]
    V1,
}

impl ConfigSchemaVersion {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "1",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MonitorConfig {
    pub schema_version: ConfigSchemaVersion,
    /// Ordered classification rules; the first matching rule assigns the area.
    pub areas: Vec<AreaRule>,
    pub coverage: CoverageConfig,
    pub snapshot_guard: SnapshotGuardConfig,
    pub schema_diff: SchemaDiffConfig,
    pub sources: SourcesConfig,
}

/// Maps records to a product area by title keyword, exact label, or source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AreaRule {
    pub area: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub sources: Vec<SourceType>,
}

impl AreaRule {
    /// Keywords match a title case-insensitively as substrings and labels
    /// exactly (ignoring case). A rule that lists sources only applies to them.
    #[must_use]
    pub fn matches(&self, title: &str, labels: &[String], source: SourceType) -> bool {
        if !self.sources.is_empty() && !self.sources.contains(&source) {
            return false;
        }
        if self.keywords.is_empty() {
            return true;
        }
        let title = title.to_lowercase();
        self.keywords.iter().any(|keyword| {
            let keyword = keyword.trim().to_lowercase();
            !keyword.is_empty()
                && (title.contains(&keyword)
                    || labels.iter().any(|l| l.trim().to_lowercase() == keyword))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CoverageConfig {
    pub default_threshold: f64,
    pub warning_threshold: f64,
    pub thresholds: BTreeMap<String, f64>,
    pub high_priority_areas: BTreeSet<String>,
    pub covered_statuses: BTreeSet<FeatureStatus>,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            default_threshold: DEFAULT_THRESHOLD,
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            thresholds: BTreeMap::new(),
            high_priority_areas: BTreeSet::new(),
            covered_statuses: BTreeSet::from([FeatureStatus::Complete]),
        }
    }
}

impl CoverageConfig {
    #[must_use]
    pub fn threshold_for(&self, area: &str) -> f64 {
        self.thresholds
            .get(area)
            .copied()
            .unwrap_or(self.default_threshold)
    }

    #[must_use]
    pub fn is_high_priority(&self, area: &str) -> bool {
        self.high_priority_areas.contains(area)
    }

    #[must_use]
    pub fn is_covered(&self, status: FeatureStatus) -> bool {
        self.covered_statuses.contains(&status)
    }

    /// Areas that must appear in a coverage report even with no features.
    #[must_use]
    pub fn configured_areas(&self) -> BTreeSet<&str> {
        self.thresholds
            .keys()
            .map(String::as_str)
            .chain(self.high_priority_areas.iter().map(String::as_str))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SnapshotGuardConfig {
    pub min_features: u64,
    pub min_ratio_of_baseline: f64,
}

impl Default for SnapshotGuardConfig {
    fn default() -> Self {
        Self {
            min_features: DEFAULT_MIN_FEATURES,
            min_ratio_of_baseline: DEFAULT_MIN_RATIO_OF_BASELINE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SchemaDiffConfig {
    pub watched_types: Vec<String>,
    pub max_fields_per_type: usize,
    pub max_unfiltered_types: usize,
    pub significant_keywords: Vec<String>,
}

impl Default for SchemaDiffConfig {
    fn default() -> Self {
        Self {
            watched_types: ["Mutation", "Query", "Repository", "PullRequest", "Issue"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            max_fields_per_type: DEFAULT_MAX_FIELDS_PER_TYPE,
            max_unfiltered_types: DEFAULT_MAX_UNFILTERED_TYPES,
            significant_keywords: ["mutation", "query", "input", "payload"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SourceToggle {
    pub enabled: bool,
}

impl Default for SourceToggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SourcesConfig {
    pub changelog: SourceToggle,
    pub roadmap: SourceToggle,
    pub graphql_schema: SourceToggle,
}

impl SourcesConfig {
    #[must_use]
    pub fn is_enabled(&self, source: SourceType) -> bool {
        match source {
            SourceType::Changelog => self.changelog.enabled,
            SourceType::Roadmap => self.roadmap.enabled,
            SourceType::GraphqlSchemaDiff => self.graphql_schema.enabled,
            _ => false,
        }
    }
}
