// Copyright (c) The ctrf-rs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use ctrf_model::{Summary, Test};

/// Computes the summary of `tests` for a run spanning `start` to `stop`.
///
/// Every test counts toward `tests`. Tests without a status count toward no other bucket.
pub fn create_summary(tests: &[Test], start: i64, stop: i64) -> Summary {
    tests.iter().fold(Summary::new(start, stop), |mut summary, test| {
        summary.record(test.status);
        summary
    })
}

/// Adds the startup duration to `summary`: the time from the start of the run to the earliest
/// test start.
///
/// Nothing is added if no test has a start time, or if the run start is unknown.
pub fn process_startup_duration(summary: &mut Summary, tests: &[Test]) {
    if summary.start <= 0 {
        return;
    }
    if let Some(first_start) = tests.iter().filter_map(|test| test.start).min() {
        summary.set_startup_duration(first_start - summary.start);
    }
}
