// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Feature monitor model SSOT.
//!
//! ```compile_fail
//! use bijux_featmon_model::TrackedField;
//!
//! fn exhaustive_match(f: TrackedField) -> &'static str {
//!     match f {
//!         TrackedField::Name => "n",
//!         TrackedField::Status => "s",
//!         TrackedField::ProductArea => "a",
//!         TrackedField::Tags => "t",
//!     }
//! }
//! ```

mod coverage;
mod diff;
mod feature;
mod snapshot;

pub use coverage::{
    AreaCoverage, AreaStatus, CoverageReport, CoverageStatus, CoverageTotals, GapDelta, GapFinding,
    GapFindings, GapSeverity, COVERAGE_SCHEMA_VERSION,
};
pub use diff::{ChangedFeature, DiffCounts, DiffResult, TrackedField, DIFF_SCHEMA_VERSION};
pub use feature::{
    FeatureKey, FeatureRecord, FeatureStatus, SourceType, ValidationError, API_AREA, KEY_MAX_LEN,
    SCHEMA_KEY_PREFIX, UNCATEGORIZED_AREA, URL_KEY_PREFIX,
};
pub use snapshot::{Snapshot, SnapshotId, SNAPSHOT_ID_FORMAT, SNAPSHOT_SCHEMA_VERSION};

pub const CRATE_NAME: &str = "bijux-featmon-model";
