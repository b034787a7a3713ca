// SPDX-License-Identifier: Apache-2.0

use std::fs;

use bijux_featmon_core::sha256_hex;
use bijux_featmon_model::{
    FeatureKey, FeatureRecord, FeatureStatus, Snapshot, SnapshotId, SourceType,
};
use bijux_featmon_store::{
    LocalFsStore, LockHolder, ReportKind, SnapshotStore, StoreErrorCode, LATEST_FILE, PUBLISH_LOCK_FILE,
    SNAPSHOTS_DIR,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tempfile::tempdir;

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, day, 8, 30, 0)
        .single()
        .expect("timestamp")
}

fn snapshot(day: u32, keys: &[&str]) -> Snapshot {
    let records = keys
        .iter()
        .map(|key| {
            FeatureRecord::new(
                FeatureKey::parse(key).expect("key"),
                format!("Feature {key}"),
                SourceType::Changelog,
                "Security",
                FeatureStatus::Complete,
                at(day),
            )
        })
        .collect();
    Snapshot::new(at(day), records).expect("snapshot")
}

#[test]
fn first_run_has_no_previous_snapshot() {
    let root = tempdir().expect("tempdir");
    let store = LocalFsStore::new(root.path().to_path_buf());
    assert!(store.load_previous().expect("load").is_none());
    assert!(store.latest_pointer().expect("pointer").is_none());
    assert!(store.list_snapshots().expect("list").is_empty());
}

#[test]
fn save_writes_snapshot_then_advances_latest() {
    let root = tempdir().expect("tempdir");
    let store = LocalFsStore::new(root.path().to_path_buf());
    let snap = snapshot(1, &["url:/a", "url:/b"]);

    let receipt = store.save(&snap).expect("save");
    assert_eq!(receipt.snapshot.snapshot_id.as_str(), "20240401T083000Z");
    assert_eq!(
        receipt.snapshot.path.as_str(),
        "snapshots/features-20240401T083000Z.json"
    );
    assert_eq!(receipt.snapshot.feature_count, 2);

    let on_disk = fs::read(root.path().join(receipt.snapshot.path.as_str())).expect("read");
    assert_eq!(sha256_hex(&on_disk), receipt.snapshot.sha256);
    assert_eq!(on_disk.len() as u64, receipt.bytes);

    let pointer = store.latest_pointer().expect("pointer").expect("some");
    assert_eq!(pointer, receipt.snapshot);
    assert_eq!(store.load_previous().expect("load"), Some(snap));

    assert!(!root.path().join(PUBLISH_LOCK_FILE).exists());
    let leftovers: Vec<_> = fs::read_dir(root.path().join(SNAPSHOTS_DIR))
        .expect("dir")
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn saving_the_same_snapshot_id_twice_is_a_conflict() {
    let root = tempdir().expect("tempdir");
    let store = LocalFsStore::new(root.path().to_path_buf());
    store.save(&snapshot(1, &["url:/a"])).expect("first save");
    let err = store
        .save(&snapshot(1, &["url:/a", "url:/b"]))
        .expect_err("overwrite must fail");
    assert_eq!(err.code, StoreErrorCode::Conflict);
    let previous = store.load_previous().expect("load").expect("some");
    assert_eq!(previous.len(), 1);
}

#[test]
fn latest_never_moves_backwards() {
    let root = tempdir().expect("tempdir");
    let store = LocalFsStore::new(root.path().to_path_buf());
    store.save(&snapshot(5, &["url:/a"])).expect("newer");
    let err = store.save(&snapshot(2, &["url:/a"])).expect_err("older");
    assert_eq!(err.code, StoreErrorCode::Conflict);
    let pointer = store.latest_pointer().expect("pointer").expect("some");
    assert_eq!(pointer.snapshot_id.as_str(), "20240405T083000Z");
}

#[test]
fn empty_snapshots_need_the_explicit_flag() {
    let root = tempdir().expect("tempdir");
    let store = LocalFsStore::new(root.path().to_path_buf());
    let err = store
        .save(&Snapshot::new(at(1), Vec::new()).expect("empty"))
        .expect_err("silent empty must fail");
    assert_eq!(err.code, StoreErrorCode::Validation);
    assert!(store.latest_pointer().expect("pointer").is_none());

    store
        .save(&Snapshot::explicit_empty(at(2)))
        .expect("explicit empty");
    let loaded = store.load_previous().expect("load").expect("some");
    assert!(loaded.is_explicit_empty());
}

#[test]
fn held_publish_lock_blocks_a_second_writer() {
    let root = tempdir().expect("tempdir");
    let store = LocalFsStore::new(root.path().to_path_buf());
    let guard = store.acquire_publish_lock().expect("lock");
    let err = store.save(&snapshot(1, &["url:/a"])).expect_err("locked");
    assert_eq!(err.code, StoreErrorCode::Conflict);
    drop(guard);
    store.save(&snapshot(1, &["url:/a"])).expect("unlocked");
}

#[test]
fn lock_left_by_a_dead_writer_names_its_holder_and_can_be_broken() {
    let root = tempdir().expect("tempdir");
    let store = LocalFsStore::new(root.path().to_path_buf());
    std::mem::forget(store.acquire_publish_lock().expect("lock"));

    let raw = fs::read(root.path().join(PUBLISH_LOCK_FILE)).expect("lock file");
    let holder: LockHolder = serde_json::from_slice(&raw).expect("holder");
    assert_eq!(holder.pid, std::process::id());

    let err = store.save(&snapshot(1, &["url:/a"])).expect_err("stale lock");
    assert_eq!(err.code, StoreErrorCode::Conflict);
    assert!(err.message.contains(&format!("pid {}", holder.pid)), "{}", err.message);
    assert!(err.message.contains("featmon store unlock"));

    let outcome = store.break_publish_lock().expect("unlock");
    assert!(outcome.removed);
    assert_eq!(outcome.holder, Some(holder));
    store.save(&snapshot(1, &["url:/a"])).expect("save after unlock");

    let again = store.break_publish_lock().expect("unlock again");
    assert!(!again.removed);
    assert_eq!(again.holder, None);
}

#[test]
fn unreadable_lock_file_still_reports_a_conflict() {
    let root = tempdir().expect("tempdir");
    let store = LocalFsStore::new(root.path().to_path_buf());
    fs::write(root.path().join(PUBLISH_LOCK_FILE), b"").expect("write lock");
    let err = store.save(&snapshot(1, &["url:/a"])).expect_err("locked");
    assert_eq!(err.code, StoreErrorCode::Conflict);
    assert!(err.message.contains("unknown writer"));
    let outcome = store.break_publish_lock().expect("unlock");
    assert!(outcome.removed);
    assert!(outcome.holder.is_none());
}

#[test]
fn tampered_snapshot_fails_checksum_and_prior_pointer_stays_valid() {
    let root = tempdir().expect("tempdir");
    let store = LocalFsStore::new(root.path().to_path_buf());
    let receipt = store.save(&snapshot(1, &["url:/a"])).expect("save");
    let path = root.path().join(receipt.snapshot.path.as_str());
    let mut bytes = fs::read(&path).expect("read");
    bytes.extend_from_slice(b" ");
    fs::write(&path, bytes).expect("tamper");

    let err = store.load_previous().expect_err("checksum");
    assert_eq!(err.code, StoreErrorCode::Validation);
    assert!(err.message.contains("sha256 mismatch"));
}

#[test]
fn corrupt_latest_pointer_is_a_validation_error() {
    let root = tempdir().expect("tempdir");
    fs::create_dir_all(root.path().join(SNAPSHOTS_DIR)).expect("dir");
    fs::write(root.path().join(SNAPSHOTS_DIR).join(LATEST_FILE), b"{not json").expect("write");
    let store = LocalFsStore::new(root.path().to_path_buf());
    let err = store.latest_pointer().expect_err("corrupt");
    assert_eq!(err.code, StoreErrorCode::Validation);
}

#[test]
fn history_is_retained_and_listed_in_order() {
    let root = tempdir().expect("tempdir");
    let store = LocalFsStore::new(root.path().to_path_buf());
    store.save(&snapshot(1, &["url:/a"])).expect("one");
    store.save(&snapshot(2, &["url:/a", "url:/b"])).expect("two");
    store.save(&snapshot(3, &["url:/b"])).expect("three");

    let listed = store.list_snapshots().expect("list");
    let ids: Vec<&str> = listed.iter().map(|r| r.snapshot_id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["20240401T083000Z", "20240402T083000Z", "20240403T083000Z"]
    );
    let second = store.load(&listed[1]).expect("load second");
    assert_eq!(second.len(), 2);
}

#[test]
fn reports_are_kept_per_snapshot_with_a_latest_slot() {
    let root = tempdir().expect("tempdir");
    let store = LocalFsStore::new(root.path().to_path_buf());
    let first = SnapshotId::parse("20240401T083000Z").expect("id");
    let second = SnapshotId::parse("20240402T083000Z").expect("id");

    assert!(store
        .read_latest_report::<serde_json::Value>(ReportKind::Coverage)
        .expect("read")
        .is_none());
    store
        .write_report(ReportKind::Coverage, &first, &serde_json::json!({"run": 1}))
        .expect("write first");
    let path = store
        .write_report(ReportKind::Coverage, &second, &serde_json::json!({"run": 2}))
        .expect("write second");
    assert!(path.ends_with("reports/coverage-20240402T083000Z.json"));

    let latest: serde_json::Value = store
        .read_latest_report(ReportKind::Coverage)
        .expect("read")
        .expect("some");
    assert_eq!(latest["run"], 2);

    let err = store
        .write_report(ReportKind::Coverage, &second, &serde_json::json!({"run": 3}))
        .expect_err("immutable");
    assert_eq!(err.code, StoreErrorCode::Conflict);
}

#[test]
fn previous_schema_snapshot_is_latest_strictly_before_date() {
    let root = tempdir().expect("tempdir");
    let store = LocalFsStore::new(root.path().to_path_buf());
    let day = |d: u32| NaiveDate::from_ymd_opt(2024, 4, d).expect("date");

    assert!(store.previous_schema_snapshot(day(10)).expect("none").is_none());
    store.save_schema_snapshot(day(1), "type A { a: Int }").expect("save");
    store.save_schema_snapshot(day(5), "type B { b: Int }").expect("save");
    store.save_schema_snapshot(day(10), "type C { c: Int }").expect("save");

    let (date, sdl) = store
        .previous_schema_snapshot(day(10))
        .expect("read")
        .expect("some");
    assert_eq!(date, day(5));
    assert_eq!(sdl, "type B { b: Int }");
    assert!(store.previous_schema_snapshot(day(1)).expect("read").is_none());
}
