// Copyright (c) The ctrf-rs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use chrono::{DateTime, FixedOffset};
use ctrf_model::{Summary, TestStatus};
use ctrf_reporter::{
    reporter::{
        FailureCause, SuiteContext, TestDescriptor, TestEvent, TestHandle, TestOutcome,
    },
    store::ReportStore,
};
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::fs;

#[test]
fn merges_earlier_report_on_start() {
    let harness = Harness::new(50_000);
    ReportStore::new(harness.report_path())
        .save(&earlier_report(
            10_000,
            &[("a", TestStatus::Passed), ("b", TestStatus::Failed)],
        ))
        .unwrap();

    let aggregator = &harness.aggregator;
    aggregator.start_test_run();
    aggregator.on_test_start(TestDescriptor::new("c-1", "c"));
    harness.clock.advance(20);
    aggregator.on_test_success(&TestHandle::new("c-1"));
    harness.clock.advance(5);
    aggregator.finish_test_run(None);

    let report = harness.written_report();
    let names: Vec<_> = report
        .results
        .tests
        .iter()
        .map(|test| test.name.as_str())
        .collect();
    assert_eq!(names, ["a", "b", "c"]);
    assert_eq!(
        report.results.summary,
        Summary {
            tests: 3,
            passed: 2,
            failed: 1,
            ..Summary::new(10_000, 50_025)
        }
    );
}

#[test]
fn unreadable_earlier_report_is_ignored() {
    let harness = Harness::new(7_000);
    fs::write(harness.report_path(), "this is not a CTRF report").unwrap();

    harness.aggregator.start_test_run();
    let report = harness.aggregator.finish_test_run(None).unwrap();

    assert!(report.results.tests.is_empty());
    assert_eq!(report.results.summary.start, 7_000);
    // The bad file is replaced with a valid report.
    assert_eq!(harness.written_report().results.summary.start, 7_000);
}

#[test]
fn unknown_status_in_earlier_report_is_kept() {
    let harness = Harness::new(5_000);
    fs::write(
        harness.report_path(),
        indoc! {r#"
            {
                "reportFormat": "CTRF",
                "specVersion": "0.0.0",
                "results": {
                    "tool": { "name": "other-runner" },
                    "summary": {
                        "tests": 1, "passed": 0, "failed": 0, "skipped": 0, "pending": 0,
                        "other": 0, "start": 2000, "stop": 2500
                    },
                    "tests": [{ "name": "a", "status": "blocked", "duration": 3 }]
                }
            }
        "#},
    )
    .unwrap();

    harness.aggregator.start_test_run();
    let report = harness.aggregator.finish_test_run(None).unwrap();

    assert_eq!(
        report.results.summary,
        Summary {
            tests: 1,
            ..Summary::new(2_000, 5_000)
        }
    );

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(harness.report_path()).unwrap()).unwrap();
    let test = &json["results"]["tests"][0];
    assert_eq!(test["name"], "a");
    assert_eq!(test["status"], "other");
    assert_eq!(test["rawStatus"], "blocked");
    assert_eq!(test["duration"], 3);
}

#[test]
fn finishing_twice_writes_once() {
    let harness = Harness::new(1_000);
    let aggregator = &harness.aggregator;

    aggregator.start_test_run();
    aggregator.finish_test_run(None);
    aggregator.finish_test_run(None);
    assert_eq!(aggregator.store().writes(), 1);

    // A new run can start after the previous one finished.
    aggregator.start_test_run();
    aggregator.finish_test_run(None);
    assert_eq!(aggregator.store().writes(), 2);
}

#[test]
fn finishing_without_start_writes_nothing() {
    let harness = Harness::new(1_000);
    assert_eq!(harness.aggregator.finish_test_run(None), None);
    assert_eq!(harness.aggregator.store().writes(), 0);
    assert!(!harness.report_path().exists());
}

#[test]
fn initialization_error_with_no_tests() {
    let harness = Harness::new(1_000);
    let aggregator = &harness.aggregator;

    aggregator.start_test_run();
    harness.clock.set(1_300);
    let context = SuiteContext::with_execution_error(FailureCause::new(
        "failed to start test harness: fixture directory missing",
    ));
    aggregator.finish_test_run(Some(&context));

    let report = harness.written_report();
    assert_eq!(report.results.tests.len(), 1);
    let test = &report.results.tests[0];
    assert_eq!(test.name, "Initialization Error");
    assert_eq!(test.status, Some(TestStatus::Failed));
    assert_eq!(test.start, Some(1_000));
    assert_eq!(test.stop, Some(1_300));
    assert_eq!(test.thread_id, None);
    assert_eq!(
        test.trace.as_deref(),
        Some("failed to start test harness: fixture directory missing")
    );
    assert_eq!(report.results.summary.failed, 1);
}

#[test]
fn execution_error_after_tests() {
    let harness = Harness::new(1_000);
    let aggregator = &harness.aggregator;

    aggregator.start_test_run();
    aggregator.write_event(TestEvent::TestStarted {
        test: TestDescriptor::new("a-1", "a"),
    });
    harness.clock.set(1_100);
    aggregator.write_event(TestEvent::TestFinished {
        handle: "a-1".into(),
        outcome: TestOutcome::Passed,
    });
    harness.clock.set(1_400);
    aggregator.write_event(TestEvent::RunFinished {
        context: Some(SuiteContext::with_execution_error(FailureCause::new(
            "global teardown failed",
        ))),
    });

    let report = harness.written_report();
    let tests = &report.results.tests;
    assert_eq!(tests.len(), 2);
    assert_eq!(tests[1].name, "Execution Error");
    assert_eq!(tests[1].start, Some(1_100));
    assert_eq!(tests[1].stop, Some(1_400));
    assert_eq!(tests[1].duration, 300);
    assert_eq!(report.results.summary.passed, 1);
    assert_eq!(report.results.summary.failed, 1);
}

#[test]
fn summary_of_mixed_outcomes() {
    let harness = Harness::new(1_000);
    let aggregator = &harness.aggregator;

    aggregator.start_test_run();
    aggregator.on_test_start(TestDescriptor::new("a-1", "A"));
    aggregator.on_test_start(TestDescriptor::new("b-1", "B"));
    harness.clock.set(2_000);
    aggregator.on_test_success(&"a-1".into());
    aggregator.on_test_failure(&"b-1".into(), None);
    aggregator.on_test_skipped(TestDescriptor::new("c-1", "C"), None);
    harness.clock.set(5_000);
    let report = aggregator.finish_test_run(None).unwrap();

    assert_eq!(
        report.results.summary,
        Summary {
            tests: 3,
            passed: 1,
            failed: 1,
            skipped: 1,
            ..Summary::new(1_000, 5_000)
        }
    );
}

#[test]
fn long_failure_messages_are_truncated() {
    let harness = Harness::with_overrides(1_000, [("report.max-message-length", "50")]);
    let aggregator = &harness.aggregator;
    let trace = format!("assertion failed: left == right\n{}", "  left: 1\n".repeat(20));

    aggregator.start_test_run();
    aggregator.on_test_start(TestDescriptor::new("a-1", "a"));
    aggregator.on_test_failure(&"a-1".into(), Some(&FailureCause::new(trace.clone())));
    aggregator.finish_test_run(None);

    let report = harness.written_report();
    let test = &report.results.tests[0];
    let message = test.message.as_deref().unwrap();
    assert!(message.chars().count() <= 53, "message is capped: {message:?}");
    assert!(message.ends_with("..."));
    assert_eq!(test.trace.as_deref(), Some(trace.as_str()));
    assert!(trace.len() > message.len());
}

#[test]
fn unknown_handle_is_not_lost() {
    let harness = Harness::new(1_000);
    let aggregator = &harness.aggregator;

    aggregator.start_test_run();
    aggregator.on_test_failure(
        &"never-started".into(),
        Some(&FailureCause::new("lost handle")),
    );
    let report = aggregator.finish_test_run(None).unwrap();

    let test = &report.results.tests[0];
    assert_eq!(test.name, "Unknown Test");
    assert_eq!(test.status, Some(TestStatus::Failed));
    assert_eq!(test.start, Some(1_000));
    assert_eq!(report.results.summary.failed, 1);
}

#[test]
fn report_is_written_under_new_directories() {
    let harness = Harness::with_overrides(1_000, [("report.path", "target/reports/ctrf.json")]);
    assert_eq!(
        harness.report_path(),
        harness.dir.path().join("target/reports/ctrf.json")
    );

    harness.aggregator.start_test_run();
    harness.aggregator.finish_test_run(None);
    assert!(harness.report_path().is_file());
}

#[test]
fn written_report_shape() {
    let harness = Harness::with_overrides(
        1_000,
        [
            ("tool.version", "1.2.3"),
            ("environment.branch-name", "main"),
        ],
    );
    let aggregator = &harness.aggregator;

    aggregator.start_test_run();
    aggregator.on_test_start(
        TestDescriptor::new("a-1", "adds_numbers")
            .with_tags(["unit"])
            .with_file_path("src/math.rs"),
    );
    harness.clock.set(1_005);
    aggregator.on_test_success(&"a-1".into());
    aggregator.finish_test_run(None);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(harness.report_path()).unwrap()).unwrap();
    assert_eq!(json["reportFormat"], "CTRF");
    assert_eq!(json["generatedBy"], "ctrf-reporter");
    assert_eq!(
        harness.written_report().timestamp,
        DateTime::from_timestamp_millis(1_005).map(DateTime::<FixedOffset>::from)
    );
    assert_eq!(json["results"]["tool"]["name"], "libtest");
    assert_eq!(json["results"]["tool"]["version"], "1.2.3");
    assert_eq!(json["results"]["environment"]["branchName"], "main");

    let test = &json["results"]["tests"][0];
    assert_eq!(test["name"], "adds_numbers");
    assert_eq!(test["status"], "passed");
    assert_eq!(test["duration"], 5);
    assert_eq!(test["tags"][0], "unit");
    assert_eq!(test["filepath"], "src/math.rs");
    assert!(test.get("retries").is_none());
    assert!(test.get("flaky").is_none());
    assert!(test.get("message").is_none());
}
