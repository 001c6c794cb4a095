// Copyright (c) The ctrf-rs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serde helpers for reading reports written by other tools.

use crate::{Report, TestStatus};
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

static RESULTS_KEY: &str = "results";
static TESTS_KEY: &str = "tests";
static STATUS_KEY: &str = "status";
static RAW_STATUS_KEY: &str = "rawStatus";

/// Deserializes an optional status, mapping unrecognized values to `None`.
///
/// Reports written by other tools (or by newer versions of the format) may carry statuses this
/// crate does not know about. Those tests are kept, but count toward no status bucket.
pub(crate) fn deserialize_lenient_status<'de, D>(
    deserializer: D,
) -> Result<Option<TestStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|status| status.parse().ok()))
}

/// Serializes a status, writing `other` for a test without a recognized one.
#[allow(clippy::ref_option)]
pub(crate) fn serialize_status<S>(
    status: &Option<TestStatus>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(status.unwrap_or(TestStatus::Other).as_str())
}

/// Parses a report from a JSON value, keeping unrecognized test statuses in `rawStatus`.
///
/// An existing `rawStatus` is left alone.
pub(crate) fn report_from_value(mut value: Value) -> serde_json::Result<Report> {
    preserve_unknown_statuses(&mut value);
    serde_json::from_value(value)
}

fn preserve_unknown_statuses(report: &mut Value) {
    let Some(tests) = report
        .get_mut(RESULTS_KEY)
        .and_then(|results| results.get_mut(TESTS_KEY))
        .and_then(Value::as_array_mut)
    else {
        return;
    };

    for test in tests.iter_mut().filter_map(Value::as_object_mut) {
        let unknown = match test.get(STATUS_KEY) {
            Some(Value::String(status)) if status.parse::<TestStatus>().is_err() => status.clone(),
            _ => continue,
        };
        if !matches!(test.get(RAW_STATUS_KEY), Some(Value::String(_))) {
            test.insert(RAW_STATUS_KEY.to_owned(), Value::String(unknown));
        }
    }
}
