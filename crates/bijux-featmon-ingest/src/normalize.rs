// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;

use bijux_featmon_model::{
    FeatureKey, FeatureRecord, FeatureStatus, SourceType, API_AREA,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::classify::AreaClassifier;
use crate::identity::{canonicalize_url_or_path, is_graphql_name, parse_timestamp};
use crate::logging::{IngestEvent, IngestLog, IngestStage};
use crate::raw::{ChangelogEntry, RawRecord, RoadmapItem, SchemaChange, SchemaChangeKind};
use crate::status::roadmap_status;

/// Why one raw record was skipped. Never fatal for the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RejectReason {
    #[error("malformed record: {detail}")]
    Malformed { detail: String },
    #[error("record source `{found}` does not match requested source `{expected}`")]
    SourceMismatch {
        expected: SourceType,
        found: SourceType,
    },
    #[error("record lacks `{field}` needed for a stable key")]
    MissingKey { field: String },
    #[error("record has a blank display name")]
    BlankName,
    #[error("record key is invalid: {detail}")]
    InvalidKey { detail: String },
}

impl RejectReason {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "malformed",
            Self::SourceMismatch { .. } => "source_mismatch",
            Self::MissingKey { .. } => "missing_key",
            Self::BlankName => "blank_name",
            Self::InvalidKey { .. } => "invalid_key",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRecord {
    pub index: usize,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizeOutcome {
    pub source: SourceType,
    pub records: Vec<FeatureRecord>,
    pub rejected: Vec<RejectedRecord>,
    pub events: Vec<IngestEvent>,
}

/// Inputs shared by every record in a batch.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext<'a> {
    /// Batch observation time: `last_seen` of every record and the fallback
    /// for missing or unparsable source timestamps.
    pub observed_at: DateTime<Utc>,
    pub classifier: &'a AreaClassifier,
}

struct Mapped {
    record: FeatureRecord,
    timestamp_fallback: bool,
}

/// Decodes each element of a JSON batch as a record of `source`, then
/// normalizes it.
///
/// An element that fails to decode is rejected as malformed; the rest of the
/// batch still goes through. A `source` tag is optional and only checked
/// against the requested source when present.
#[must_use]
pub fn normalize_values(
    batch: Vec<Value>,
    source: SourceType,
    ctx: &NormalizeContext<'_>,
) -> NormalizeOutcome {
    let decoded = batch
        .into_iter()
        .map(|value| decode_element(value, source))
        .collect();
    normalize_decoded(decoded, source, ctx)
}

fn decode_element(value: Value, source: SourceType) -> Result<RawRecord, RejectReason> {
    match value.get("source") {
        None | Some(Value::Null) => {}
        Some(Value::String(tag)) => {
            let found = SourceType::parse(tag)
                .map_err(|e| RejectReason::Malformed { detail: e.0 })?;
            if found != source {
                return Err(RejectReason::SourceMismatch {
                    expected: source,
                    found,
                });
            }
        }
        Some(other) => {
            return Err(RejectReason::Malformed {
                detail: format!("`source` must be a string, found `{other}`"),
            })
        }
    }
    let decoded = match source {
        SourceType::Changelog => serde_json::from_value(value).map(RawRecord::Changelog),
        SourceType::Roadmap => serde_json::from_value(value).map(RawRecord::Roadmap),
        SourceType::GraphqlSchemaDiff => {
            serde_json::from_value(value).map(RawRecord::GraphqlSchemaDiff)
        }
        other => {
            return Err(RejectReason::Malformed {
                detail: format!("no record shape for source `{other}`"),
            })
        }
    };
    decoded.map_err(|e| RejectReason::Malformed {
        detail: e.to_string(),
    })
}

#[must_use]
pub fn normalize(
    records: Vec<RawRecord>,
    source: SourceType,
    ctx: &NormalizeContext<'_>,
) -> NormalizeOutcome {
    normalize_decoded(records.into_iter().map(Ok).collect(), source, ctx)
}

fn normalize_decoded(
    batch: Vec<Result<RawRecord, RejectReason>>,
    source: SourceType,
    ctx: &NormalizeContext<'_>,
) -> NormalizeOutcome {
    let span = tracing::info_span!("normalize", source = source.as_str(), batch = batch.len());
    let _guard = span.enter();

    let mut log = IngestLog::default();
    log.emit(
        IngestStage::Prepare,
        "normalize.start",
        [("source", source.as_str().to_string()), ("batch_size", batch.len().to_string())],
    );

    let mut records = Vec::new();
    let mut rejected = Vec::new();
    for (index, item) in batch.into_iter().enumerate() {
        let mapped = item.and_then(|raw| map_record(raw, source, ctx));
        match mapped {
            Ok(mapped) => {
                if mapped.timestamp_fallback {
                    tracing::warn!(
                        index,
                        key = mapped.record.key.as_str(),
                        "timestamp missing or unparsable; using observation time"
                    );
                    log.emit(
                        IngestStage::Map,
                        "normalize.timestamp_fallback",
                        [
                            ("index", index.to_string()),
                            ("key", mapped.record.key.to_string()),
                        ],
                    );
                }
                records.push(mapped.record);
            }
            Err(reason) => {
                tracing::warn!(index, code = reason.code(), %reason, "rejected raw record");
                log.emit(
                    IngestStage::Decode,
                    "normalize.reject",
                    [
                        ("index", index.to_string()),
                        ("code", reason.code().to_string()),
                    ],
                );
                rejected.push(RejectedRecord { index, reason });
            }
        }
    }

    tracing::info!(
        accepted = records.len(),
        rejected = rejected.len(),
        "normalized batch"
    );
    log.emit(
        IngestStage::Finalize,
        "normalize.complete",
        [
            ("accepted", records.len().to_string()),
            ("rejected", rejected.len().to_string()),
        ],
    );

    NormalizeOutcome {
        source,
        records,
        rejected,
        events: log.into_events(),
    }
}

fn map_record(
    raw: RawRecord,
    source: SourceType,
    ctx: &NormalizeContext<'_>,
) -> Result<Mapped, RejectReason> {
    let found = raw.source_type();
    if found != source {
        return Err(RejectReason::SourceMismatch {
            expected: source,
            found,
        });
    }
    match raw {
        RawRecord::Changelog(entry) => map_changelog(entry, ctx),
        RawRecord::Roadmap(item) => map_roadmap(item, ctx),
        RawRecord::GraphqlSchemaDiff(change) => map_schema_change(change, ctx),
    }
}

fn map_changelog(entry: ChangelogEntry, ctx: &NormalizeContext<'_>) -> Result<Mapped, RejectReason> {
    let (key, canonical) = url_key(entry.url_or_path.as_deref())?;
    let name = display_name(&entry.title)?;
    let area = ctx
        .classifier
        .classify(&name, &entry.labels, SourceType::Changelog);
    let tags = source_tags("changelog", &entry.labels);
    let (first_seen, timestamp_fallback) = seen_at(entry.timestamp.as_deref(), ctx.observed_at);
    Ok(Mapped {
        record: FeatureRecord {
            key,
            name,
            source_type: SourceType::Changelog,
            source_url: Some(canonical),
            product_area: area,
            status: FeatureStatus::Complete,
            tags,
            first_seen,
            last_seen: ctx.observed_at,
            raw_metadata: entry.raw_metadata,
        },
        timestamp_fallback,
    })
}

fn map_roadmap(item: RoadmapItem, ctx: &NormalizeContext<'_>) -> Result<Mapped, RejectReason> {
    let (key, canonical) = url_key(item.url_or_path.as_deref())?;
    let name = display_name(&item.title)?;
    let area = ctx
        .classifier
        .classify(&name, &item.labels, SourceType::Roadmap);
    let status = roadmap_status(item.status.as_deref(), &item.labels);
    let tags = source_tags("roadmap", &item.labels);
    let (first_seen, timestamp_fallback) = seen_at(item.timestamp.as_deref(), ctx.observed_at);
    let mut raw_metadata = item.raw_metadata;
    if let Some(number) = item.number {
        raw_metadata
            .entry("number".to_string())
            .or_insert_with(|| Value::from(number));
    }
    Ok(Mapped {
        record: FeatureRecord {
            key,
            name,
            source_type: SourceType::Roadmap,
            source_url: Some(canonical),
            product_area: area,
            status,
            tags,
            first_seen,
            last_seen: ctx.observed_at,
            raw_metadata,
        },
        timestamp_fallback,
    })
}

fn map_schema_change(
    change: SchemaChange,
    ctx: &NormalizeContext<'_>,
) -> Result<Mapped, RejectReason> {
    let type_name = change.type_name.trim();
    if type_name.is_empty() {
        return Err(RejectReason::MissingKey {
            field: "type_name".to_string(),
        });
    }
    if !is_graphql_name(type_name) {
        return Err(RejectReason::InvalidKey {
            detail: format!("`{type_name}` is not a GraphQL name"),
        });
    }
    let field_name = match change.kind {
        SchemaChangeKind::NewType => None,
        SchemaChangeKind::NewField | SchemaChangeKind::NewMutation => {
            let field = change
                .field_name
                .as_deref()
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .ok_or_else(|| RejectReason::MissingKey {
                    field: "field_name".to_string(),
                })?;
            if !is_graphql_name(field) {
                return Err(RejectReason::InvalidKey {
                    detail: format!("`{field}` is not a GraphQL name"),
                });
            }
            Some(field)
        }
    };

    let key = FeatureKey::from_schema_path(change.kind.as_str(), type_name, field_name)
        .map_err(|e| RejectReason::InvalidKey { detail: e.0 })?;
    let name = match field_name {
        Some(field) => format!("New GraphQL Field: {type_name}.{field}"),
        None => format!("New GraphQL Type: {type_name}"),
    };
    let mut tags: BTreeSet<String> = ["graphql", "api", "schema-change", change.kind.as_str()]
        .into_iter()
        .map(str::to_string)
        .collect();
    tags.insert(type_name.to_lowercase());
    let (first_seen, timestamp_fallback) = match change.timestamp.as_deref() {
        // Schema diffs are observations; a missing timestamp is expected.
        None => (ctx.observed_at, false),
        raw => seen_at(raw, ctx.observed_at),
    };

    Ok(Mapped {
        record: FeatureRecord {
            key,
            name,
            source_type: SourceType::GraphqlSchemaDiff,
            source_url: None,
            product_area: API_AREA.to_string(),
            status: FeatureStatus::Complete,
            tags,
            first_seen,
            last_seen: ctx.observed_at,
            raw_metadata: change.raw_metadata,
        },
        timestamp_fallback,
    })
}

fn url_key(url_or_path: Option<&str>) -> Result<(FeatureKey, String), RejectReason> {
    let raw = url_or_path
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| RejectReason::MissingKey {
            field: "url_or_path".to_string(),
        })?;
    let canonical =
        canonicalize_url_or_path(raw).map_err(|detail| RejectReason::InvalidKey { detail })?;
    let key = FeatureKey::from_canonical_url(&canonical)
        .map_err(|e| RejectReason::InvalidKey { detail: e.0 })?;
    Ok((key, canonical))
}

fn display_name(title: &str) -> Result<String, RejectReason> {
    let name = title.trim();
    if name.is_empty() {
        return Err(RejectReason::BlankName);
    }
    Ok(name.to_string())
}

fn source_tags(source_tag: &str, labels: &[String]) -> BTreeSet<String> {
    labels
        .iter()
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .chain(std::iter::once(source_tag.to_string()))
        .collect()
}

fn seen_at(raw: Option<&str>, observed_at: DateTime<Utc>) -> (DateTime<Utc>, bool) {
    match raw.and_then(parse_timestamp) {
        Some(ts) => (ts, false),
        None => (observed_at, true),
    }
}
