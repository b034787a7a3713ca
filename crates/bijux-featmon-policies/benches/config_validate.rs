// SPDX-License-Identifier: Apache-2.0

use bijux_featmon_policies::{evaluate_config, parse_config_yaml, AreaRule, MonitorConfig};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const CONFIG: &str = include_str!("../../../configs/featmon.yaml");

fn bench_config_validate(c: &mut Criterion) {
    let mut config = MonitorConfig::default();
    for idx in 0..64 {
        config.areas.push(AreaRule {
            area: format!("Area{idx}"),
            keywords: vec![format!("keyword{idx}")],
            sources: vec![],
        });
        config
            .coverage
            .thresholds
            .insert(format!("Area{idx}"), 0.5);
    }

    c.bench_function("evaluate_config_64_areas", |b| {
        b.iter(|| evaluate_config(black_box(&config)))
    });
    c.bench_function("parse_workspace_config", |b| {
        b.iter(|| parse_config_yaml(black_box(CONFIG)))
    });
}

criterion_group!(benches, bench_config_validate);
criterion_main!(benches);
