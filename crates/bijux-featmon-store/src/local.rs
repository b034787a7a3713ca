// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bijux_featmon_core::canonical::stable_json_pretty;
use bijux_featmon_core::sha256_hex;
use bijux_featmon_model::{Snapshot, SnapshotId};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreErrorCode};
use crate::fsutil::{
    create_dir_all, read_lock_holder, replace_atomic, sync_dir, tmp_path, write_and_sync,
    LockHolder, PublishLockGuard,
};
use crate::paths::{
    parse_schema_file_name, parse_snapshot_file_name, report_file_name, report_latest_file_name,
    schema_file_name, snapshot_rel_path, ReportKind, StorePath, LATEST_FILE, PUBLISH_LOCK_FILE,
    REPORTS_DIR, SCHEMAS_DIR, SNAPSHOTS_DIR,
};

/// Reference to a persisted snapshot; also the content of the `LATEST` pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotRef {
    pub snapshot_id: SnapshotId,
    pub path: StorePath,
    pub sha256: String,
    pub feature_count: u64,
}

/// Result of [`LocalFsStore::break_publish_lock`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnlockOutcome {
    pub removed: bool,
    pub holder: Option<LockHolder>,
}

/// Write confirmation returned by [`SnapshotStore::save`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveReceipt {
    pub snapshot: SnapshotRef,
    pub bytes: u64,
}

pub trait SnapshotStore {
    /// The snapshot `LATEST` points to, or `None` on first run.
    fn load_previous(&self) -> Result<Option<Snapshot>, StoreError>;
    fn save(&self, snapshot: &Snapshot) -> Result<SaveReceipt, StoreError>;
    fn latest_pointer(&self) -> Result<Option<SnapshotRef>, StoreError>;
    fn list_snapshots(&self) -> Result<Vec<SnapshotRef>, StoreError>;
    fn load(&self, reference: &SnapshotRef) -> Result<Snapshot, StoreError>;
}

#[derive(Debug, Clone)]
pub struct LocalFsStore {
    pub root: PathBuf,
}

impl LocalFsStore {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn snapshots_dir(&self) -> PathBuf {
        self.root.join(SNAPSHOTS_DIR)
    }

    fn latest_path(&self) -> PathBuf {
        self.snapshots_dir().join(LATEST_FILE)
    }

    fn resolve(&self, path: &StorePath) -> PathBuf {
        self.root.join(path.as_str())
    }

    pub fn acquire_publish_lock(&self) -> Result<PublishLockGuard, StoreError> {
        create_dir_all(&self.root)?;
        PublishLockGuard::acquire(self.root.join(PUBLISH_LOCK_FILE))
    }

    /// Removes a publish lock left behind by a writer that died mid-save.
    ///
    /// Only safe when no writer is running; the recorded holder is returned so
    /// the caller can report whose lock was broken.
    pub fn break_publish_lock(&self) -> Result<UnlockOutcome, StoreError> {
        let lock_path = self.root.join(PUBLISH_LOCK_FILE);
        let holder = read_lock_holder(&lock_path);
        match fs::remove_file(&lock_path) {
            Ok(()) => {
                tracing::warn!(?holder, "publish lock removed");
                Ok(UnlockOutcome {
                    removed: true,
                    holder,
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(UnlockOutcome {
                removed: false,
                holder: None,
            }),
            Err(e) => Err(StoreError::io(
                &format!("remove {}", lock_path.display()),
                &e,
            )),
        }
    }

    /// Persists a report under its snapshot id and replaces the kind's `-latest` slot.
    pub fn write_report<T: Serialize>(
        &self,
        kind: ReportKind,
        id: &SnapshotId,
        report: &T,
    ) -> Result<PathBuf, StoreError> {
        let dir = self.root.join(REPORTS_DIR);
        create_dir_all(&dir)?;
        let bytes = stable_json_pretty(report)
            .map_err(|e| StoreError::new(StoreErrorCode::Internal, e.to_string()))?;
        let path = dir.join(report_file_name(kind, id));
        if path.exists() {
            return Err(StoreError::new(
                StoreErrorCode::Conflict,
                format!("{} report for {id} already exists", kind.as_str()),
            ));
        }
        replace_atomic(&path, &bytes)?;
        replace_atomic(&dir.join(report_latest_file_name(kind)), &bytes)?;
        tracing::info!(kind = kind.as_str(), snapshot_id = %id, "report written");
        Ok(path)
    }

    pub fn read_latest_report<T: DeserializeOwned>(
        &self,
        kind: ReportKind,
    ) -> Result<Option<T>, StoreError> {
        let path = self
            .root
            .join(REPORTS_DIR)
            .join(report_latest_file_name(kind));
        let Some(bytes) = read_optional(&path)? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            StoreError::new(
                StoreErrorCode::Validation,
                format!("decode {} failed: {e}", path.display()),
            )
        })
    }

    /// Stores raw SDL for `date`; a later save on the same date replaces it.
    pub fn save_schema_snapshot(&self, date: NaiveDate, sdl: &str) -> Result<PathBuf, StoreError> {
        let dir = self.root.join(SCHEMAS_DIR);
        create_dir_all(&dir)?;
        let path = dir.join(schema_file_name(date));
        replace_atomic(&path, sdl.as_bytes())?;
        tracing::info!(path = %path.display(), bytes = sdl.len(), "schema snapshot saved");
        Ok(path)
    }

    /// Latest schema snapshot dated strictly before `before`.
    pub fn previous_schema_snapshot(
        &self,
        before: NaiveDate,
    ) -> Result<Option<(NaiveDate, String)>, StoreError> {
        let dir = self.root.join(SCHEMAS_DIR);
        let previous = list_file_names(&dir)?
            .iter()
            .filter_map(|name| parse_schema_file_name(name))
            .filter(|date| *date < before)
            .max();
        let Some(date) = previous else {
            return Ok(None);
        };
        let path = dir.join(schema_file_name(date));
        let sdl = fs::read_to_string(&path)
            .map_err(|e| StoreError::io(&format!("read {}", path.display()), &e))?;
        Ok(Some((date, sdl)))
    }

    fn validate_written(
        &self,
        tmp: &Path,
        expected_sha256: &str,
        expected_id: &SnapshotId,
    ) -> Result<Snapshot, StoreError> {
        let bytes =
            fs::read(tmp).map_err(|e| StoreError::io(&format!("reread {}", tmp.display()), &e))?;
        verify_sha256(&bytes, expected_sha256)?;
        let reread = decode_snapshot(&bytes, tmp)?;
        if reread.is_empty() && !reread.is_explicit_empty() {
            return Err(StoreError::new(
                StoreErrorCode::Validation,
                "written snapshot is empty but not flagged explicit_empty",
            ));
        }
        if &reread.id() != expected_id {
            return Err(StoreError::new(
                StoreErrorCode::Validation,
                format!("written snapshot id {} != {expected_id}", reread.id()),
            ));
        }
        Ok(reread)
    }
}

impl SnapshotStore for LocalFsStore {
    fn load_previous(&self) -> Result<Option<Snapshot>, StoreError> {
        match self.latest_pointer()? {
            Some(pointer) => self.load(&pointer).map(Some),
            None => {
                tracing::info!(root = %self.root.display(), "no LATEST pointer; empty baseline");
                Ok(None)
            }
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<SaveReceipt, StoreError> {
        if snapshot.is_empty() && !snapshot.is_explicit_empty() {
            return Err(StoreError::new(
                StoreErrorCode::Validation,
                "refusing to persist an empty snapshot that is not flagged explicit_empty",
            ));
        }
        let _guard = self.acquire_publish_lock()?;

        let id = snapshot.id();
        let rel = snapshot_rel_path(&id)?;
        let target = self.resolve(&rel);
        if target.exists() {
            return Err(StoreError::new(
                StoreErrorCode::Conflict,
                format!("snapshot {id} already exists and is immutable"),
            ));
        }
        let current = self.latest_pointer()?;
        if let Some(latest) = &current {
            if latest.snapshot_id > id {
                return Err(StoreError::new(
                    StoreErrorCode::Conflict,
                    format!(
                        "snapshot {id} is older than LATEST {}",
                        latest.snapshot_id
                    ),
                ));
            }
        }

        let dir = self.snapshots_dir();
        create_dir_all(&dir)?;
        let bytes = stable_json_pretty(snapshot)
            .map_err(|e| StoreError::new(StoreErrorCode::Internal, e.to_string()))?;
        let sha256 = sha256_hex(&bytes);
        let tmp = tmp_path(&target);
        write_and_sync(&tmp, &bytes)?;
        if let Err(err) = self.validate_written(&tmp, &sha256, &id) {
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }
        fs::rename(&tmp, &target)
            .map_err(|e| StoreError::io(&format!("rename into {}", target.display()), &e))?;
        sync_dir(&dir)?;

        let reference = SnapshotRef {
            snapshot_id: id,
            path: rel,
            sha256,
            feature_count: snapshot.len() as u64,
        };
        let pointer_bytes = stable_json_pretty(&reference)
            .map_err(|e| StoreError::new(StoreErrorCode::Internal, e.to_string()))?;
        replace_atomic(&self.latest_path(), &pointer_bytes)?;

        tracing::info!(
            snapshot_id = %reference.snapshot_id,
            features = reference.feature_count,
            sha256 = %reference.sha256,
            "snapshot saved and LATEST advanced"
        );
        Ok(SaveReceipt {
            snapshot: reference,
            bytes: bytes.len() as u64,
        })
    }

    fn latest_pointer(&self) -> Result<Option<SnapshotRef>, StoreError> {
        let path = self.latest_path();
        let Some(bytes) = read_optional(&path)? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            StoreError::new(
                StoreErrorCode::Validation,
                format!("LATEST pointer is corrupt: {e}"),
            )
        })
    }

    fn list_snapshots(&self) -> Result<Vec<SnapshotRef>, StoreError> {
        let mut ids: Vec<SnapshotId> = list_file_names(&self.snapshots_dir())?
            .iter()
            .filter_map(|name| parse_snapshot_file_name(name))
            .collect();
        ids.sort();
        ids.into_iter()
            .map(|id| {
                let path = snapshot_rel_path(&id)?;
                let bytes = fs::read(self.resolve(&path))
                    .map_err(|e| StoreError::io(&format!("read {}", path.as_str()), &e))?;
                let snapshot = decode_snapshot(&bytes, &self.resolve(&path))?;
                Ok(SnapshotRef {
                    snapshot_id: id,
                    path,
                    sha256: sha256_hex(&bytes),
                    feature_count: snapshot.len() as u64,
                })
            })
            .collect()
    }

    fn load(&self, reference: &SnapshotRef) -> Result<Snapshot, StoreError> {
        let path = self.resolve(&reference.path);
        let bytes = fs::read(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StoreError::new(
                    StoreErrorCode::NotFound,
                    format!("snapshot {} missing at {}", reference.snapshot_id, path.display()),
                )
            } else {
                StoreError::io(&format!("read {}", path.display()), &e)
            }
        })?;
        verify_sha256(&bytes, &reference.sha256)?;
        let snapshot = decode_snapshot(&bytes, &path)?;
        if snapshot.id() != reference.snapshot_id {
            return Err(StoreError::new(
                StoreErrorCode::Validation,
                format!(
                    "snapshot at {} has id {}, pointer says {}",
                    path.display(),
                    snapshot.id(),
                    reference.snapshot_id
                ),
            ));
        }
        Ok(snapshot)
    }
}

fn verify_sha256(bytes: &[u8], expected: &str) -> Result<(), StoreError> {
    let actual = sha256_hex(bytes);
    if actual != expected {
        return Err(StoreError::new(
            StoreErrorCode::Validation,
            format!("sha256 mismatch expected={expected} actual={actual}"),
        ));
    }
    Ok(())
}

fn decode_snapshot(bytes: &[u8], path: &Path) -> Result<Snapshot, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| {
        StoreError::new(
            StoreErrorCode::Validation,
            format!("decode snapshot {} failed: {e}", path.display()),
        )
    })
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(&format!("read {}", path.display()), &e)),
    }
}

fn list_file_names(dir: &Path) -> Result<Vec<String>, StoreError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io(&format!("list {}", dir.display()), &e)),
    };
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StoreError::io(&format!("list {}", dir.display()), &e))?;
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}
