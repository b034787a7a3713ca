// SPDX-License-Identifier: Apache-2.0

use crate::feature::{FeatureKey, FeatureRecord, ValidationError};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;
pub const SNAPSHOT_ID_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Identity of a persisted snapshot, derived from its generation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SnapshotId(String);

impl SnapshotId {
    #[must_use]
    pub fn from_timestamp(at: DateTime<Utc>) -> Self {
        Self(at.format(SNAPSHOT_ID_FORMAT).to_string())
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        NaiveDateTime::parse_from_str(input, SNAPSHOT_ID_FORMAT).map_err(|e| {
            ValidationError(format!(
                "snapshot id `{input}` must match YYYYMMDDTHHMMSSZ: {e}"
            ))
        })?;
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SnapshotId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SnapshotId> for String {
    fn from(value: SnapshotId) -> Self {
        value.0
    }
}

impl Display for SnapshotId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotRepr {
    schema_version: u32,
    generated_at: DateTime<Utc>,
    #[serde(default)]
    explicit_empty: bool,
    features: Vec<FeatureRecord>,
}

/// Immutable set of feature records observed at one point in time.
///
/// Features are held sorted by key and keys are unique; both properties are
/// enforced on construction and on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotRepr")]
pub struct Snapshot {
    schema_version: u32,
    generated_at: DateTime<Utc>,
    explicit_empty: bool,
    features: Vec<FeatureRecord>,
}

impl TryFrom<SnapshotRepr> for Snapshot {
    type Error = ValidationError;

    fn try_from(repr: SnapshotRepr) -> Result<Self, Self::Error> {
        if repr.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(ValidationError(format!(
                "snapshot schema version mismatch: expected {SNAPSHOT_SCHEMA_VERSION}, got {}",
                repr.schema_version
            )));
        }
        if repr.explicit_empty && !repr.features.is_empty() {
            return Err(ValidationError(
                "snapshot flagged explicit_empty must not carry features".to_string(),
            ));
        }
        let mut snapshot = Self::new(repr.generated_at, repr.features)?;
        snapshot.explicit_empty = repr.explicit_empty;
        Ok(snapshot)
    }
}

impl Snapshot {
    pub fn new(
        generated_at: DateTime<Utc>,
        mut features: Vec<FeatureRecord>,
    ) -> Result<Self, ValidationError> {
        features.sort_by(|a, b| a.key.cmp(&b.key));
        if let Some(pair) = features.windows(2).find(|w| w[0].key == w[1].key) {
            return Err(ValidationError(format!(
                "duplicate feature key in snapshot: {}",
                pair[0].key
            )));
        }
        Ok(Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            generated_at,
            explicit_empty: false,
            features,
        })
    }

    /// An intentionally empty state, distinct from an ingestion that found nothing.
    #[must_use]
    pub fn explicit_empty(generated_at: DateTime<Utc>) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            generated_at,
            explicit_empty: true,
            features: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> SnapshotId {
        SnapshotId::from_timestamp(self.generated_at)
    }

    #[must_use]
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    #[must_use]
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    #[must_use]
    pub fn is_explicit_empty(&self) -> bool {
        self.explicit_empty
    }

    #[must_use]
    pub fn features(&self) -> &[FeatureRecord] {
        &self.features
    }

    #[must_use]
    pub fn into_features(self) -> Vec<FeatureRecord> {
        self.features
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &FeatureKey) -> Option<&FeatureRecord> {
        self.features
            .binary_search_by(|f| f.key.cmp(key))
            .ok()
            .map(|idx| &self.features[idx])
    }

    #[must_use]
    pub fn by_key(&self) -> BTreeMap<&FeatureKey, &FeatureRecord> {
        self.features.iter().map(|f| (&f.key, f)).collect()
    }
}
