// SPDX-License-Identifier: Apache-2.0

use bijux_featmon_model::{API_AREA, UNCATEGORIZED_AREA};
use serde::Serialize;
use serde_json::Value;

use crate::schema::MonitorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ConfigSeverity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigViolation {
    pub id: &'static str,
    pub severity: ConfigSeverity,
    pub message: &'static str,
    pub evidence: String,
}

impl std::fmt::Display for ConfigViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.id, self.message, self.evidence)
    }
}

#[derive(Debug, Clone, Copy)]
enum RuleKind {
    UnitInterval,
    NumberMin(u64),
    ArrayNonEmpty,
}

#[derive(Debug, Clone, Copy)]
struct RuleSpec {
    id: &'static str,
    severity: ConfigSeverity,
    message: &'static str,
    path: &'static str,
    kind: RuleKind,
}

const CONFIG_RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "config.coverage.default_threshold.range",
        severity: ConfigSeverity::Error,
        message: "coverage.default_threshold must be within [0, 1]",
        path: "coverage.default_threshold",
        kind: RuleKind::UnitInterval,
    },
    RuleSpec {
        id: "config.coverage.warning_threshold.range",
        severity: ConfigSeverity::Error,
        message: "coverage.warning_threshold must be within [0, 1]",
        path: "coverage.warning_threshold",
        kind: RuleKind::UnitInterval,
    },
    RuleSpec {
        id: "config.coverage.covered_statuses.non_empty",
        severity: ConfigSeverity::Error,
        message: "coverage.covered_statuses must not be empty",
        path: "coverage.covered_statuses",
        kind: RuleKind::ArrayNonEmpty,
    },
    RuleSpec {
        id: "config.snapshot_guard.min_ratio_of_baseline.range",
        severity: ConfigSeverity::Error,
        message: "snapshot_guard.min_ratio_of_baseline must be within [0, 1]",
        path: "snapshot_guard.min_ratio_of_baseline",
        kind: RuleKind::UnitInterval,
    },
    RuleSpec {
        id: "config.schema_diff.max_fields_per_type.min",
        severity: ConfigSeverity::Error,
        message: "schema_diff.max_fields_per_type must be > 0",
        path: "schema_diff.max_fields_per_type",
        kind: RuleKind::NumberMin(1),
    },
    RuleSpec {
        id: "config.schema_diff.max_unfiltered_types.min",
        severity: ConfigSeverity::Error,
        message: "schema_diff.max_unfiltered_types must be > 0",
        path: "schema_diff.max_unfiltered_types",
        kind: RuleKind::NumberMin(1),
    },
    RuleSpec {
        id: "config.schema_diff.watched_types.non_empty",
        severity: ConfigSeverity::Warning,
        message: "schema_diff.watched_types is empty; no new fields will be reported",
        path: "schema_diff.watched_types",
        kind: RuleKind::ArrayNonEmpty,
    },
];

/// Runs the rule table plus the cross-field checks over a decoded config.
#[must_use]
pub fn evaluate_config(config: &MonitorConfig) -> Vec<ConfigViolation> {
    let mut violations = Vec::new();
    let value = match serde_json::to_value(config) {
        Ok(value) => value,
        Err(error) => {
            violations.push(ConfigViolation {
                id: "config.serialization.failure",
                severity: ConfigSeverity::Error,
                message: "config serialization failed",
                evidence: error.to_string(),
            });
            return violations;
        }
    };

    for rule in CONFIG_RULES {
        apply_rule(&value, *rule, &mut violations);
    }

    let coverage = &config.coverage;
    if coverage.warning_threshold.is_finite()
        && coverage.default_threshold.is_finite()
        && coverage.warning_threshold < coverage.default_threshold
    {
        violations.push(ConfigViolation {
            id: "config.coverage.warning_threshold.below_default",
            severity: ConfigSeverity::Error,
            message: "coverage.warning_threshold must be >= coverage.default_threshold",
            evidence: format!(
                "warning_threshold={} default_threshold={}",
                coverage.warning_threshold, coverage.default_threshold
            ),
        });
    }

    for (area, threshold) in &coverage.thresholds {
        if !(0.0..=1.0).contains(threshold) {
            violations.push(ConfigViolation {
                id: "config.coverage.thresholds.range",
                severity: ConfigSeverity::Error,
                message: "per-area coverage thresholds must be within [0, 1]",
                evidence: format!("area={area} threshold={threshold}"),
            });
        }
        if area.trim().is_empty() {
            violations.push(ConfigViolation {
                id: "config.coverage.thresholds.area.blank",
                severity: ConfigSeverity::Error,
                message: "threshold area names must not be blank",
                evidence: format!("area={area:?}"),
            });
        } else if !is_reachable_area(config, area) {
            violations.push(ConfigViolation {
                id: "config.coverage.thresholds.unknown_area",
                severity: ConfigSeverity::Warning,
                message: "threshold configured for an area no rule assigns",
                evidence: format!("area={area}"),
            });
        }
    }

    for area in &coverage.high_priority_areas {
        if area.trim().is_empty() {
            violations.push(ConfigViolation {
                id: "config.coverage.high_priority_areas.blank",
                severity: ConfigSeverity::Error,
                message: "high priority area names must not be blank",
                evidence: format!("area={area:?}"),
            });
        }
    }

    for (index, rule) in config.areas.iter().enumerate() {
        if rule.area.trim().is_empty() {
            violations.push(ConfigViolation {
                id: "config.areas.name.blank",
                severity: ConfigSeverity::Error,
                message: "area rule must name an area",
                evidence: format!("areas[{index}]"),
            });
        }
        if rule.keywords.is_empty() && rule.sources.is_empty() {
            violations.push(ConfigViolation {
                id: "config.areas.catch_all",
                severity: ConfigSeverity::Error,
                message: "area rule must declare keywords or sources",
                evidence: format!("areas[{index}] area={}", rule.area),
            });
        }
        if rule.keywords.iter().any(|k| k.trim().is_empty()) {
            violations.push(ConfigViolation {
                id: "config.areas.keyword.blank",
                severity: ConfigSeverity::Warning,
                message: "blank keywords never match and are ignored",
                evidence: format!("areas[{index}] area={}", rule.area),
            });
        }
    }

    let sources = &config.sources;
    if !sources.changelog.enabled && !sources.roadmap.enabled && !sources.graphql_schema.enabled {
        violations.push(ConfigViolation {
            id: "config.sources.all_disabled",
            severity: ConfigSeverity::Warning,
            message: "every source is disabled; runs will produce empty snapshots",
            evidence: "sources.*.enabled=false".to_string(),
        });
    }

    violations
}

fn is_reachable_area(config: &MonitorConfig, area: &str) -> bool {
    area == UNCATEGORIZED_AREA || area == API_AREA || config.areas.iter().any(|r| r.area == area)
}

fn apply_rule(root: &Value, rule: RuleSpec, out: &mut Vec<ConfigViolation>) {
    let Some(value) = field_path(root, rule.path) else {
        out.push(ConfigViolation {
            id: rule.id,
            severity: ConfigSeverity::Error,
            message: "required config path missing",
            evidence: format!("path={}", rule.path),
        });
        return;
    };

    // NaN serializes as null, so it fails the interval check.
    let pass = match rule.kind {
        RuleKind::UnitInterval => value.as_f64().is_some_and(|n| (0.0..=1.0).contains(&n)),
        RuleKind::NumberMin(min) => value.as_u64().is_some_and(|n| n >= min),
        RuleKind::ArrayNonEmpty => value.as_array().is_some_and(|v| !v.is_empty()),
    };

    if !pass {
        out.push(ConfigViolation {
            id: rule.id,
            severity: rule.severity,
            message: rule.message,
            evidence: format!("path={} value={}", rule.path, value),
        });
    }
}

fn field_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cur = root;
    for seg in path.split('.') {
        cur = cur.get(seg)?;
    }
    Some(cur)
}
