// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Normalizer: maps raw source-adapter records into canonical feature records
//! with stable identity keys, and derives schema-diff records from SDL.

mod classify;
mod graphql_diff;
mod identity;
mod logging;
mod normalize;
mod raw;
mod status;

use serde_json::Value;
use thiserror::Error;

pub use classify::AreaClassifier;
pub use graphql_diff::{detect_schema_changes, parse_schema_types, parse_type_fields};
pub use identity::{canonicalize_url_or_path, parse_timestamp};
pub use logging::{IngestEvent, IngestLog, IngestStage};
pub use normalize::{
    normalize, normalize_values, NormalizeContext, NormalizeOutcome, RejectReason, RejectedRecord,
};
pub use raw::{ChangelogEntry, RawRecord, RoadmapItem, SchemaChange, SchemaChangeKind};
pub use status::roadmap_status;

pub const CRATE_NAME: &str = "bijux-featmon-ingest";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("raw batch is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("raw batch must be a JSON array, found {0}")]
    NotArray(&'static str),
}

/// Splits a source-adapter payload into its elements without decoding them,
/// so one malformed element cannot sink the batch.
pub fn decode_batch(raw: &str) -> Result<Vec<Value>, IngestError> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Array(items) => Ok(items),
        Value::Null => Err(IngestError::NotArray("null")),
        Value::Bool(_) => Err(IngestError::NotArray("boolean")),
        Value::Number(_) => Err(IngestError::NotArray("number")),
        Value::String(_) => Err(IngestError::NotArray("string")),
        Value::Object(_) => Err(IngestError::NotArray("object")),
    }
}

/// Wraps schema changes as tagged raw records, ready for [`normalize`].
#[must_use]
pub fn schema_changes_as_raw(changes: Vec<SchemaChange>) -> Vec<RawRecord> {
    changes.into_iter().map(RawRecord::GraphqlSchemaDiff).collect()
}
