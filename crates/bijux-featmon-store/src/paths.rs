// SPDX-License-Identifier: Apache-2.0

use bijux_featmon_model::SnapshotId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreErrorCode};

pub const SNAPSHOTS_DIR: &str = "snapshots";
pub const SCHEMAS_DIR: &str = "schemas";
pub const REPORTS_DIR: &str = "reports";
pub const LATEST_FILE: &str = "LATEST";
pub const PUBLISH_LOCK_FILE: &str = ".publish.lock";

const SNAPSHOT_PREFIX: &str = "features-";
const SCHEMA_PREFIX: &str = "schema-";
const SCHEMA_DATE_FORMAT: &str = "%Y-%m-%d";

/// Store-relative path; never absolute and never escaping the root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StorePath(String);

impl StorePath {
    pub fn parse(value: impl Into<String>) -> Result<Self, StoreError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(StoreError::new(
                StoreErrorCode::Validation,
                "store path must not be empty",
            ));
        }
        if value.starts_with('/') || value.split('/').any(|seg| seg == "..") {
            return Err(StoreError::new(
                StoreErrorCode::Validation,
                format!("store path must be relative and normalized: {value}"),
            ));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StorePath {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<StorePath> for String {
    fn from(value: StorePath) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ReportKind {
    Diff,
    Coverage,
    Gaps,
}

impl ReportKind {
    pub const ALL: [Self; 3] = [Self::Diff, Self::Coverage, Self::Gaps];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Diff => "diff",
            Self::Coverage => "coverage",
            Self::Gaps => "gaps",
        }
    }
}

#[must_use]
pub fn snapshot_file_name(id: &SnapshotId) -> String {
    format!("{SNAPSHOT_PREFIX}{id}.json")
}

pub fn snapshot_rel_path(id: &SnapshotId) -> Result<StorePath, StoreError> {
    StorePath::parse(format!("{SNAPSHOTS_DIR}/{}", snapshot_file_name(id)))
}

#[must_use]
pub fn parse_snapshot_file_name(name: &str) -> Option<SnapshotId> {
    let id = name.strip_prefix(SNAPSHOT_PREFIX)?.strip_suffix(".json")?;
    SnapshotId::parse(id).ok()
}

#[must_use]
pub fn schema_file_name(date: NaiveDate) -> String {
    format!("{SCHEMA_PREFIX}{}.graphql", date.format(SCHEMA_DATE_FORMAT))
}

#[must_use]
pub fn parse_schema_file_name(name: &str) -> Option<NaiveDate> {
    let date = name.strip_prefix(SCHEMA_PREFIX)?.strip_suffix(".graphql")?;
    NaiveDate::parse_from_str(date, SCHEMA_DATE_FORMAT).ok()
}

#[must_use]
pub fn report_file_name(kind: ReportKind, id: &SnapshotId) -> String {
    format!("{}-{id}.json", kind.as_str())
}

#[must_use]
pub fn report_latest_file_name(kind: ReportKind) -> String {
    format!("{}-latest.json", kind.as_str())
}
