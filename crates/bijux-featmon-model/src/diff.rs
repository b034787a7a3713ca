// SPDX-License-Identifier: Apache-2.0

use crate::feature::{FeatureKey, FeatureRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const DIFF_SCHEMA_VERSION: u32 = 1;

/// Record fields compared by the diff engine. Everything else on a record is
/// observational and never produces a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum TrackedField {
    Name,
    Status,
    ProductArea,
    Tags,
}

impl TrackedField {
    pub const ALL: [Self; 4] = [Self::Name, Self::Status, Self::ProductArea, Self::Tags];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Status => "status",
            Self::ProductArea => "product_area",
            Self::Tags => "tags",
        }
    }

    /// True when `old` and `new` disagree on this field. Tags compare as sets.
    #[must_use]
    pub fn differs(self, old: &FeatureRecord, new: &FeatureRecord) -> bool {
        match self {
            Self::Name => old.name != new.name,
            Self::Status => old.status != new.status,
            Self::ProductArea => old.product_area != new.product_area,
            Self::Tags => old.tags != new.tags,
        }
    }
}

impl Display for TrackedField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangedFeature {
    pub key: FeatureKey,
    pub fields: Vec<TrackedField>,
    pub old: FeatureRecord,
    pub new: FeatureRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiffCounts {
    pub total_old: u64,
    pub total_new: u64,
    pub added: u64,
    pub removed: u64,
    pub changed: u64,
}

impl DiffCounts {
    #[must_use]
    pub fn net_change(&self) -> i64 {
        self.total_new as i64 - self.total_old as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiffResult {
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    pub baseline_generated_at: Option<DateTime<Utc>>,
    pub current_generated_at: DateTime<Utc>,
    pub counts: DiffCounts,
    pub added: Vec<FeatureRecord>,
    pub removed: Vec<FeatureRecord>,
    pub changed: Vec<ChangedFeature>,
}

impl DiffResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}
