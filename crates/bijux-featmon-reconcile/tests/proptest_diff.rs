// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, BTreeSet};

use bijux_featmon_model::{FeatureKey, FeatureRecord, FeatureStatus, Snapshot, SourceType};
use bijux_featmon_policies::CoverageConfig;
use bijux_featmon_reconcile::{diff, evaluate, DiffOptions};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use proptest::test_runner::Config;

const AREAS: [&str; 3] = ["Security", "Actions", "Copilot"];

fn unguarded() -> DiffOptions {
    DiffOptions {
        min_features: 0,
        min_ratio_of_baseline: 0.0,
        generated_at: None,
    }
}

fn snapshot_strategy() -> impl Strategy<Value = Snapshot> {
    prop::collection::btree_map(
        "[a-f]{1,3}",
        (0_usize..4, 0_usize..3, prop::collection::btree_set("[xyz]", 0..3)),
        0..12,
    )
    .prop_map(|entries: BTreeMap<String, (usize, usize, BTreeSet<String>)>| {
        let at = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp");
        let records = entries
            .into_iter()
            .map(|(path, (status, area, tags))| {
                FeatureRecord::new(
                    FeatureKey::parse(&format!("url:/{path}")).expect("key"),
                    format!("Feature {path}"),
                    SourceType::Roadmap,
                    AREAS[area],
                    FeatureStatus::ALL[status],
                    at,
                )
                .with_tags(tags)
            })
            .collect();
        Snapshot::new(at, records).expect("snapshot")
    })
}

fn keys(records: &[FeatureRecord]) -> Vec<FeatureKey> {
    records.iter().map(|r| r.key.clone()).collect()
}

proptest! {
    #![proptest_config(Config::with_cases(128))]
    #[test]
    fn added_and_removed_swap_when_inputs_swap(a in snapshot_strategy(), b in snapshot_strategy()) {
        let forward = diff(Some(&a), &b, &unguarded()).expect("diff");
        let backward = diff(Some(&b), &a, &unguarded()).expect("diff");
        prop_assert_eq!(keys(&forward.added), keys(&backward.removed));
        prop_assert_eq!(keys(&forward.removed), keys(&backward.added));
        prop_assert_eq!(forward.changed.len(), backward.changed.len());
    }

    #[test]
    fn self_diff_is_empty(a in snapshot_strategy()) {
        let result = diff(Some(&a), &a, &DiffOptions::default()).expect("diff");
        prop_assert!(result.is_empty());
    }

    #[test]
    fn each_key_lands_in_at_most_one_bucket(a in snapshot_strategy(), b in snapshot_strategy()) {
        let result = diff(Some(&a), &b, &unguarded()).expect("diff");
        let mut seen = BTreeSet::new();
        for key in result
            .added
            .iter()
            .map(|r| &r.key)
            .chain(result.removed.iter().map(|r| &r.key))
            .chain(result.changed.iter().map(|c| &c.key))
        {
            prop_assert!(seen.insert(key.clone()), "key {} classified twice", key);
        }
        for change in &result.changed {
            prop_assert!(!change.fields.is_empty());
            for field in &change.fields {
                prop_assert!(field.differs(&change.old, &change.new));
            }
        }
        prop_assert_eq!(result.counts.added as usize, result.added.len());
        prop_assert_eq!(result.counts.total_new as usize, b.len());
    }

    #[test]
    fn coverage_ratios_stay_in_unit_interval(a in snapshot_strategy()) {
        let report = evaluate(&a, &CoverageConfig::default(), None);
        for area in &report.areas {
            prop_assert!((0.0..=1.0).contains(&area.ratio));
            if area.total == 0 {
                prop_assert!(!area.is_gap());
            }
        }
        prop_assert_eq!(report.totals.total_features as usize, a.len());
    }
}
