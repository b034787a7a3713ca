// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Snapshot store. Snapshots are immutable once written; the `LATEST`
//! pointer only moves after the snapshot it names is durable and verified.

mod error;
mod fsutil;
mod local;
mod paths;

pub use error::{StoreError, StoreErrorCode};
pub use fsutil::{LockHolder, PublishLockGuard};
pub use local::{LocalFsStore, SaveReceipt, SnapshotRef, SnapshotStore, UnlockOutcome};
pub use paths::{
    parse_schema_file_name, parse_snapshot_file_name, report_file_name, report_latest_file_name,
    schema_file_name, snapshot_file_name, snapshot_rel_path, ReportKind, StorePath, LATEST_FILE,
    PUBLISH_LOCK_FILE, REPORTS_DIR, SCHEMAS_DIR, SNAPSHOTS_DIR,
};

pub const CRATE_NAME: &str = "bijux-featmon-store";
