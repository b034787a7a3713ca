// SPDX-License-Identifier: Apache-2.0

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreErrorCode};

pub(crate) fn write_and_sync(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut f = fs::File::create(path)
        .map_err(|e| StoreError::io(&format!("create {}", path.display()), &e))?;
    f.write_all(bytes)
        .map_err(|e| StoreError::io(&format!("write {}", path.display()), &e))?;
    f.sync_all()
        .map_err(|e| StoreError::io(&format!("sync {}", path.display()), &e))?;
    Ok(())
}

pub(crate) fn sync_dir(dir: &Path) -> Result<(), StoreError> {
    let f = OpenOptions::new()
        .read(true)
        .open(dir)
        .map_err(|e| StoreError::io(&format!("open dir {}", dir.display()), &e))?;
    f.sync_all()
        .map_err(|e| StoreError::io(&format!("sync dir {}", dir.display()), &e))?;
    Ok(())
}

/// Writes `bytes` next to `target`, syncs, renames over `target`, then syncs the directory.
pub(crate) fn replace_atomic(target: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp = tmp_path(target);
    write_and_sync(&tmp, bytes)?;
    fs::rename(&tmp, target)
        .map_err(|e| StoreError::io(&format!("rename into {}", target.display()), &e))?;
    if let Some(parent) = target.parent() {
        sync_dir(parent)?;
    }
    Ok(())
}

pub(crate) fn tmp_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

pub(crate) fn create_dir_all(dir: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(dir).map_err(|e| StoreError::io(&format!("create dir {}", dir.display()), &e))
}

/// Writer recorded in the publish lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LockHolder {
    pub pid: u32,
    pub created_at: DateTime<Utc>,
}

/// Holder of the lock at `lock_path`; `None` when the file is absent or unreadable.
pub(crate) fn read_lock_holder(lock_path: &Path) -> Option<LockHolder> {
    let raw = fs::read(lock_path).ok()?;
    serde_json::from_slice(&raw).ok()
}

/// Single-writer guard; the lock file is removed when the guard drops.
///
/// The file records the owning pid and creation time so a lock left behind by
/// a killed writer can be identified and broken.
#[derive(Debug)]
pub struct PublishLockGuard {
    lock_path: PathBuf,
}

impl PublishLockGuard {
    pub(crate) fn acquire(lock_path: PathBuf) -> Result<Self, StoreError> {
        let mut file = match OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&lock_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let holder = read_lock_holder(&lock_path).map_or_else(
                    || "an unknown writer".to_string(),
                    |h| format!("pid {} since {}", h.pid, h.created_at.to_rfc3339()),
                );
                return Err(StoreError::new(
                    StoreErrorCode::Conflict,
                    format!(
                        "publish lock {} is held by {holder}; if that process is gone, run `featmon store unlock`",
                        lock_path.display()
                    ),
                ));
            }
            Err(e) => {
                return Err(StoreError::io(
                    &format!("acquire publish lock {}", lock_path.display()),
                    &e,
                ))
            }
        };
        let guard = Self { lock_path };
        let holder = LockHolder {
            pid: std::process::id(),
            created_at: Utc::now(),
        };
        let bytes = serde_json::to_vec(&holder)
            .map_err(|e| StoreError::new(StoreErrorCode::Internal, e.to_string()))?;
        file.write_all(&bytes)
            .and_then(|()| file.sync_all())
            .map_err(|e| StoreError::io(&format!("write {}", guard.lock_path.display()), &e))?;
        Ok(guard)
    }
}

impl Drop for PublishLockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}
