// SPDX-License-Identifier: Apache-2.0

use bijux_featmon_model::{
    FeatureKey, FeatureRecord, FeatureStatus, Snapshot, SnapshotId, SourceType, TrackedField,
    KEY_MAX_LEN,
};
use chrono::{DateTime, TimeZone, Utc};

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).single().expect("timestamp")
}

fn record(key: &str, status: FeatureStatus) -> FeatureRecord {
    FeatureRecord::new(
        FeatureKey::parse(key).expect("key"),
        "Feature",
        SourceType::Changelog,
        "Security",
        status,
        at(1),
    )
}

#[test]
fn feature_key_requires_known_namespace() {
    assert!(FeatureKey::parse("url:https://example.com/a").is_ok());
    assert!(FeatureKey::parse("graphql:new-type:Widget").is_ok());
    assert!(FeatureKey::parse("https://example.com/a").is_err());
    assert!(FeatureKey::parse("url:").is_err());
    assert!(FeatureKey::parse("").is_err());
}

#[test]
fn feature_key_rejects_hidden_whitespace_and_oversize() {
    assert!(FeatureKey::parse(" url:/a").is_err());
    assert!(FeatureKey::parse("url:/a b").is_err());
    let long = format!("url:/{}", "a".repeat(KEY_MAX_LEN));
    assert!(FeatureKey::parse(&long).is_err());
}

#[test]
fn schema_keys_encode_kind_and_path() {
    let ty = FeatureKey::from_schema_path("new-type", "Widget", None).expect("type key");
    let field =
        FeatureKey::from_schema_path("new-field", "Query", Some("widgets")).expect("field key");
    assert_eq!(ty.as_str(), "graphql:new-type:Widget");
    assert_eq!(field.as_str(), "graphql:new-field:Query.widgets");
    assert!(!field.is_url_key());
}

#[test]
fn snapshot_sorts_by_key_and_rejects_duplicates() {
    let snapshot = Snapshot::new(
        at(2),
        vec![
            record("url:/b", FeatureStatus::Complete),
            record("url:/a", FeatureStatus::Planned),
        ],
    )
    .expect("snapshot");
    let keys: Vec<&str> = snapshot.features().iter().map(|f| f.key.as_str()).collect();
    assert_eq!(keys, vec!["url:/a", "url:/b"]);
    assert!(snapshot
        .get(&FeatureKey::parse("url:/b").expect("key"))
        .is_some());

    let dup = Snapshot::new(
        at(2),
        vec![
            record("url:/a", FeatureStatus::Complete),
            record("url:/a", FeatureStatus::Planned),
        ],
    );
    assert!(dup.is_err());
}

#[test]
fn snapshot_id_is_second_resolution_utc() {
    let snapshot = Snapshot::explicit_empty(at(5));
    assert_eq!(snapshot.id().as_str(), "20240305T120000Z");
    assert!(SnapshotId::parse("20240305T120000Z").is_ok());
    assert!(SnapshotId::parse("2024-03-05").is_err());
}

#[test]
fn tracked_fields_compare_tags_as_sets() {
    let old = record("url:/a", FeatureStatus::Complete).with_tags(["beta", "api"]);
    let new = record("url:/a", FeatureStatus::Complete).with_tags(["api", "beta"]);
    assert!(TrackedField::ALL.iter().all(|f| !f.differs(&old, &new)));

    let moved = FeatureRecord {
        product_area: "Actions".to_string(),
        ..new.clone()
    };
    assert!(TrackedField::ProductArea.differs(&new, &moved));
    assert!(!TrackedField::Name.differs(&new, &moved));
}

#[test]
fn raw_metadata_and_timestamps_are_not_tracked() {
    let old = record("url:/a", FeatureStatus::Complete);
    let mut new = old.clone();
    new.last_seen = at(9);
    new.raw_metadata
        .insert("etag".to_string(), serde_json::json!("abc"));
    assert!(TrackedField::ALL.iter().all(|f| !f.differs(&old, &new)));
}

#[test]
fn status_and_source_parse_from_wire_names() {
    assert_eq!(
        FeatureStatus::parse("in-progress").expect("status"),
        FeatureStatus::InProgress
    );
    assert_eq!(
        SourceType::parse("graphql_schema_diff").expect("source"),
        SourceType::GraphqlSchemaDiff
    );
    assert!(FeatureStatus::parse("done").is_err());
}
