// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}

pub const KEY_MAX_LEN: usize = 512;
pub const URL_KEY_PREFIX: &str = "url:";
pub const SCHEMA_KEY_PREFIX: &str = "graphql:";

/// Area assigned when no classification rule matches.
pub const UNCATEGORIZED_AREA: &str = "uncategorized";
/// Fixed area for schema-diff records.
pub const API_AREA: &str = "API";

/// Stable identity of a feature across snapshots.
///
/// Keys are namespaced by how identity was proven: `url:` keys come from a
/// canonical URL or path and are shared by every URL-bearing source, so the
/// same page announced in the changelog and on the roadmap collides; `graphql:`
/// keys come from a schema path plus change kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FeatureKey(String);

impl FeatureKey {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        if input.is_empty() {
            return Err(ValidationError("feature key must not be empty".to_string()));
        }
        if input.len() > KEY_MAX_LEN {
            return Err(ValidationError(format!(
                "feature key exceeds max length {KEY_MAX_LEN}"
            )));
        }
        if input.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValidationError(format!(
                "feature key must not contain whitespace: `{input}`"
            )));
        }
        let natural = input
            .strip_prefix(URL_KEY_PREFIX)
            .or_else(|| input.strip_prefix(SCHEMA_KEY_PREFIX))
            .ok_or_else(|| {
                ValidationError(format!(
                    "feature key must start with `{URL_KEY_PREFIX}` or `{SCHEMA_KEY_PREFIX}`: `{input}`"
                ))
            })?;
        if natural.is_empty() {
            return Err(ValidationError(format!(
                "feature key has an empty natural key: `{input}`"
            )));
        }
        Ok(Self(input.to_string()))
    }

    /// Builds a key from an already canonicalized URL or absolute path.
    pub fn from_canonical_url(canonical: &str) -> Result<Self, ValidationError> {
        Self::parse(&format!("{URL_KEY_PREFIX}{canonical}"))
    }

    /// Builds a key from a schema path and the kind of change observed on it.
    pub fn from_schema_path(
        change_kind: &str,
        type_name: &str,
        field_name: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let path = match field_name {
            Some(field) => format!("{type_name}.{field}"),
            None => type_name.to_string(),
        };
        Self::parse(&format!("{SCHEMA_KEY_PREFIX}{change_kind}:{path}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_url_key(&self) -> bool {
        self.0.starts_with(URL_KEY_PREFIX)
    }
}

impl TryFrom<String> for FeatureKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FeatureKey> for String {
    fn from(value: FeatureKey) -> Self {
        value.0
    }
}

impl Display for FeatureKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum SourceType {
    Changelog,
    Roadmap,
    GraphqlSchemaDiff,
}

impl SourceType {
    pub const ALL: [Self; 3] = [Self::Changelog, Self::Roadmap, Self::GraphqlSchemaDiff];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Changelog => "changelog",
            Self::Roadmap => "roadmap",
            Self::GraphqlSchemaDiff => "graphql_schema_diff",
        }
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == input.trim())
            .ok_or_else(|| ValidationError(format!("unknown source type `{input}`")))
    }
}

impl Display for SourceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum FeatureStatus {
    Planned,
    InProgress,
    Complete,
    Unknown,
}

impl FeatureStatus {
    pub const ALL: [Self; 4] = [Self::Planned, Self::InProgress, Self::Complete, Self::Unknown];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::InProgress => "in-progress",
            Self::Complete => "complete",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == input.trim())
            .ok_or_else(|| ValidationError(format!("unknown feature status `{input}`")))
    }
}

impl Display for FeatureStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical, source-independent unit tracked across snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureRecord {
    pub key: FeatureKey,
    pub name: String,
    pub source_type: SourceType,
    #[serde(default)]
    pub source_url: Option<String>,
    pub product_area: String,
    pub status: FeatureStatus,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Retained for audit only; never compared by the diff engine.
    #[serde(default)]
    pub raw_metadata: BTreeMap<String, serde_json::Value>,
}

impl FeatureRecord {
    #[must_use]
    pub fn new(
        key: FeatureKey,
        name: impl Into<String>,
        source_type: SourceType,
        product_area: impl Into<String>,
        status: FeatureStatus,
        seen_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            name: name.into(),
            source_type,
            source_url: None,
            product_area: product_area.into(),
            status,
            tags: BTreeSet::new(),
            first_seen: seen_at,
            last_seen: seen_at,
            raw_metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }
}
