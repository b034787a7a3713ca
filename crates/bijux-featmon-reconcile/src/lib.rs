// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Change-detection core. Every function here is a pure transformation over
//! snapshots and reports: no clock, no filesystem, no network.

mod coverage;
mod diff;
mod gaps;
mod merge;

pub use coverage::evaluate;
pub use diff::{diff, DiffError, DiffOptions};
pub use gaps::{gap_delta, gap_findings};
pub use merge::{reconcile, MergeOutcome};

pub const CRATE_NAME: &str = "bijux-featmon-reconcile";
