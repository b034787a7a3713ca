// SPDX-License-Identifier: Apache-2.0

use bijux_featmon_model::FeatureStatus;

const COMPLETE_PHRASES: &[&str] = &["shipped", "ga", "generally available", "released", "complete"];
const IN_PROGRESS_PHRASES: &[&str] = &["in progress", "beta", "preview", "public preview"];
const PLANNED_PHRASES: &[&str] = &["planned", "exploring", "in design"];

fn phrase_status(raw: &str) -> Option<FeatureStatus> {
    let phrase = raw
        .trim()
        .to_lowercase()
        .replace(&['-', '_'][..], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if COMPLETE_PHRASES.contains(&phrase.as_str()) {
        Some(FeatureStatus::Complete)
    } else if IN_PROGRESS_PHRASES.contains(&phrase.as_str()) {
        Some(FeatureStatus::InProgress)
    } else if PLANNED_PHRASES.contains(&phrase.as_str()) {
        Some(FeatureStatus::Planned)
    } else {
        None
    }
}

/// The explicit status wins when it is recognized; labels are consulted in order otherwise.
#[must_use]
pub fn roadmap_status(status: Option<&str>, labels: &[String]) -> FeatureStatus {
    status
        .and_then(phrase_status)
        .or_else(|| labels.iter().find_map(|l| phrase_status(l)))
        .unwrap_or(FeatureStatus::Unknown)
}
