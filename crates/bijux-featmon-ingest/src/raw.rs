// SPDX-License-Identifier: Apache-2.0

use bijux_featmon_model::SourceType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Raw record as produced by a source adapter.
///
/// Adapters hand over untagged records and the normalizer picks the variant
/// from the batch's source type; the serialized form carries a `source` tag.
/// Fields needed for identity are optional here so that a record lacking them
/// is rejected by the normalizer with a precise reason instead of failing decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum RawRecord {
    Changelog(ChangelogEntry),
    Roadmap(RoadmapItem),
    GraphqlSchemaDiff(SchemaChange),
}

impl RawRecord {
    #[must_use]
    pub fn source_type(&self) -> SourceType {
        match self {
            Self::Changelog(_) => SourceType::Changelog,
            Self::Roadmap(_) => SourceType::Roadmap,
            Self::GraphqlSchemaDiff(_) => SourceType::GraphqlSchemaDiff,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChangelogEntry {
    #[serde(default)]
    pub url_or_path: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub raw_metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoadmapItem {
    #[serde(default)]
    pub url_or_path: Option<String>,
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub raw_metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaChangeKind {
    NewType,
    NewField,
    NewMutation,
}

impl SchemaChangeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewType => "new-type",
            Self::NewField => "new-field",
            Self::NewMutation => "new-mutation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaChange {
    #[serde(default)]
    pub type_name: String,
    #[serde(default)]
    pub field_name: Option<String>,
    pub kind: SchemaChangeKind,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub raw_metadata: BTreeMap<String, Value>,
}

impl SchemaChange {
    #[must_use]
    pub fn new(kind: SchemaChangeKind, type_name: &str, field_name: Option<&str>) -> Self {
        Self {
            type_name: type_name.to_string(),
            field_name: field_name.map(str::to_string),
            kind,
            timestamp: None,
            raw_metadata: BTreeMap::new(),
        }
    }
}
