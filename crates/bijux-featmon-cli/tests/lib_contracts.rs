// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use bijux_featmon_cli::{run_pipeline, PipelineError, RunInputs};
use bijux_featmon_core::ExitCode;
use bijux_featmon_model::{CoverageStatus, SourceType};
use bijux_featmon_policies::{MonitorConfig, SourceToggle};
use bijux_featmon_store::{LocalFsStore, SnapshotStore};
use chrono::{DateTime, TimeZone, Utc};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, day, 8, 0, 0)
        .single()
        .expect("timestamp")
}

fn inputs(day: u32, changelog: &str) -> RunInputs {
    RunInputs {
        changelog: Some(fixture(changelog)),
        roadmap: None,
        schema: None,
        observed_at: at(day),
        explicit_empty: false,
        dry_run: false,
    }
}

#[test]
fn default_config_classifies_everything_as_uncategorized() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = LocalFsStore::new(tmp.path().to_path_buf());
    let summary =
        run_pipeline(&MonitorConfig::default(), &store, &inputs(1, "changelog.json")).expect("run");
    assert_eq!(summary.features, 4);
    assert_eq!(summary.coverage_status, CoverageStatus::Pass);
    assert!(summary.gaps.is_empty());
    let saved = summary.saved.expect("saved");
    assert_eq!(saved.feature_count, 4);
    let reloaded = store.load_previous().expect("load").expect("latest");
    assert!(reloaded
        .features()
        .iter()
        .all(|f| f.product_area == "uncategorized"));
}

#[test]
fn disabled_sources_are_skipped() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = LocalFsStore::new(tmp.path().to_path_buf());
    let mut config = MonitorConfig::default();
    config.sources.roadmap = SourceToggle { enabled: false };
    let mut run = inputs(1, "changelog.json");
    run.roadmap = Some(fixture("roadmap.json"));
    let summary = run_pipeline(&config, &store, &run).expect("run");
    assert_eq!(summary.skipped_sources, vec![SourceType::Roadmap]);
    assert_eq!(summary.features, 4);
}

#[test]
fn suspicious_snapshot_leaves_store_untouched() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = LocalFsStore::new(tmp.path().to_path_buf());
    let config = MonitorConfig::default();
    run_pipeline(&config, &store, &inputs(1, "changelog.json")).expect("first run");
    let before = store.latest_pointer().expect("pointer");

    let err = run_pipeline(&config, &store, &inputs(2, "changelog_partial.json"))
        .expect_err("guard must trip");
    assert!(matches!(err, PipelineError::Diff(_)));
    assert_eq!(err.exit_code(), ExitCode::Validation);
    assert_eq!(store.latest_pointer().expect("pointer"), before);
    assert_eq!(store.list_snapshots().expect("list").len(), 1);
}

#[test]
fn explicit_empty_run_clears_the_baseline() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = LocalFsStore::new(tmp.path().to_path_buf());
    let config = MonitorConfig::default();
    run_pipeline(&config, &store, &inputs(1, "changelog.json")).expect("first run");

    let empty = RunInputs {
        changelog: None,
        explicit_empty: true,
        ..inputs(2, "changelog.json")
    };
    let summary = run_pipeline(&config, &store, &empty).expect("explicit empty");
    assert_eq!(summary.diff.removed, 4);
    assert!(summary.saved.is_some());
    let latest = store.load_previous().expect("load").expect("latest");
    assert!(latest.is_explicit_empty());
}

#[test]
fn missing_input_file_is_a_usage_error() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = LocalFsStore::new(tmp.path().to_path_buf());
    let err = run_pipeline(
        &MonitorConfig::default(),
        &store,
        &inputs(1, "does-not-exist.json"),
    )
    .expect_err("missing input");
    assert_eq!(err.exit_code(), ExitCode::Usage);
    assert_eq!(err.code(), "input_unreadable");
}
