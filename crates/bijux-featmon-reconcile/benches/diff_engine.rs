// SPDX-License-Identifier: Apache-2.0

use bijux_featmon_model::{FeatureKey, FeatureRecord, FeatureStatus, Snapshot, SourceType};
use bijux_featmon_policies::CoverageConfig;
use bijux_featmon_reconcile::{diff, evaluate, DiffOptions};
use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const AREAS: [&str; 4] = ["Security", "Actions", "Copilot", "Packages"];

fn snapshot(len: usize, shift: usize, status: FeatureStatus) -> Snapshot {
    let at = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("timestamp");
    let records = (shift..len + shift)
        .map(|idx| {
            FeatureRecord::new(
                FeatureKey::parse(&format!("url:/changelog/{idx:06}")).expect("key"),
                format!("Feature {idx}"),
                SourceType::Changelog,
                AREAS[idx % AREAS.len()],
                if idx % 3 == 0 { status } else { FeatureStatus::Complete },
                at,
            )
        })
        .collect();
    Snapshot::new(at, records).expect("snapshot")
}

fn bench_diff(c: &mut Criterion) {
    let baseline = snapshot(10_000, 0, FeatureStatus::InProgress);
    let current = snapshot(10_000, 500, FeatureStatus::Complete);
    let options = DiffOptions::default();
    c.bench_function("diff_10000", |b| {
        b.iter(|| black_box(diff(Some(&baseline), &current, &options).expect("diff")))
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let current = snapshot(10_000, 0, FeatureStatus::InProgress);
    let config = CoverageConfig::default();
    c.bench_function("evaluate_10000", |b| {
        b.iter(|| black_box(evaluate(&current, &config, None)))
    });
}

criterion_group!(benches, bench_diff, bench_evaluate);
criterion_main!(benches);
