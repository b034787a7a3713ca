// SPDX-License-Identifier: Apache-2.0

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use bijux_featmon_model::{FeatureKey, FeatureRecord, Snapshot, ValidationError};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub snapshot: Snapshot,
    /// Keys seen again after their first occurrence, in encounter order.
    pub duplicates: Vec<FeatureKey>,
    /// Surviving keys whose `first_seen` came from the previous snapshot.
    pub carried_forward: u64,
}

/// Merges normalized batches into the next snapshot.
///
/// Batches are read in order and the first record for a key wins; later ones
/// are counted as duplicates. Keys already present in `previous` keep their
/// original `first_seen`.
pub fn reconcile<I>(
    previous: Option<&Snapshot>,
    batches: I,
    generated_at: DateTime<Utc>,
) -> Result<MergeOutcome, ValidationError>
where
    I: IntoIterator<Item = Vec<FeatureRecord>>,
{
    let mut merged: BTreeMap<FeatureKey, FeatureRecord> = BTreeMap::new();
    let mut duplicates = Vec::new();
    for record in batches.into_iter().flatten() {
        match merged.entry(record.key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(_) => duplicates.push(record.key),
        }
    }

    let mut carried_forward = 0_u64;
    if let Some(previous) = previous {
        for record in merged.values_mut() {
            if let Some(prior) = previous.get(&record.key) {
                record.first_seen = prior.first_seen;
                carried_forward += 1;
            }
        }
    }

    if !duplicates.is_empty() {
        tracing::info!(duplicates = duplicates.len(), "dropped duplicate keys during merge");
    }
    let snapshot = Snapshot::new(generated_at, merged.into_values().collect())?;
    Ok(MergeOutcome {
        snapshot,
        duplicates,
        carried_forward,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bijux_featmon_model::{FeatureStatus, SourceType};
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, 0, 0, 0)
            .single()
            .expect("timestamp")
    }

    fn record(key: &str, source: SourceType, day: u32) -> FeatureRecord {
        FeatureRecord::new(
            FeatureKey::parse(key).expect("key"),
            key,
            source,
            "Security",
            FeatureStatus::Complete,
            at(day),
        )
    }

    #[test]
    fn first_batch_wins_on_duplicate_keys() {
        let outcome = reconcile(
            None,
            vec![
                vec![record("url:/a", SourceType::Changelog, 1)],
                vec![
                    record("url:/a", SourceType::Roadmap, 2),
                    record("url:/b", SourceType::Roadmap, 2),
                ],
            ],
            at(3),
        )
        .expect("merge");
        assert_eq!(outcome.snapshot.len(), 2);
        assert_eq!(outcome.duplicates.len(), 1);
        let a = outcome
            .snapshot
            .get(&FeatureKey::parse("url:/a").expect("key"))
            .expect("a");
        assert_eq!(a.source_type, SourceType::Changelog);
    }

    #[test]
    fn first_seen_is_carried_forward_from_previous() {
        let previous = Snapshot::new(at(1), vec![record("url:/a", SourceType::Changelog, 1)])
            .expect("previous");
        let outcome = reconcile(
            Some(&previous),
            vec![vec![
                record("url:/a", SourceType::Changelog, 9),
                record("url:/b", SourceType::Changelog, 9),
            ]],
            at(10),
        )
        .expect("merge");
        let by_key = outcome.snapshot.by_key();
        let a = by_key[&FeatureKey::parse("url:/a").expect("key")];
        let b = by_key[&FeatureKey::parse("url:/b").expect("key")];
        assert_eq!(a.first_seen, at(1));
        assert_eq!(a.last_seen, at(9));
        assert_eq!(b.first_seen, at(9));
        assert_eq!(outcome.carried_forward, 1);
        assert_eq!(outcome.snapshot.generated_at(), at(10));
    }
}
