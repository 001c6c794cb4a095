// Copyright (c) The ctrf-rs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use ctrf_model::TestStatus;
use ctrf_reporter::{
    config::CtrfConfig,
    reporter::{ReportAggregator, TestDescriptor, TestHandle},
};
use pretty_assertions::assert_eq;
use std::{collections::HashSet, sync::Arc, thread};

const WORKERS: usize = 8;
const TESTS_PER_WORKER: usize = 50;

#[test]
fn parallel_workers_lose_no_records() {
    test_init();
    let dir = camino_tempfile::Utf8TempDir::new().unwrap();
    let report_path = dir.path().join("ctrf-report.json");
    let config = CtrfConfig::with_overrides([("report.path", report_path.as_str())]).unwrap();
    let aggregator = Arc::new(ReportAggregator::new(&config));

    aggregator.start_test_run();
    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let aggregator = Arc::clone(&aggregator);
            thread::Builder::new()
                .name(format!("worker-{worker}"))
                .spawn(move || {
                    for index in 0..TESTS_PER_WORKER {
                        let handle = TestHandle::new(format!("{worker}-{index}"));
                        aggregator.on_test_start(TestDescriptor::new(
                            handle.clone(),
                            format!("test_{worker}_{index}"),
                        ));
                        if index % 10 == 0 {
                            aggregator.on_test_failure(&handle, None);
                        } else {
                            aggregator.on_test_success(&handle);
                        }
                    }

                    // Every worker also runs one attempt of a shared test.
                    let handle = TestHandle::new(format!("shared-{worker}"));
                    aggregator.on_test_start(TestDescriptor::new(handle.clone(), "shared"));
                    aggregator.on_test_success(&handle);
                })
                .unwrap()
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let report = aggregator.finish_test_run(None).unwrap();
    let tests = &report.results.tests;
    assert_eq!(tests.len(), WORKERS * (TESTS_PER_WORKER + 1));

    let names: HashSet<_> = tests.iter().map(|test| test.name.as_str()).collect();
    assert_eq!(names.len(), WORKERS * TESTS_PER_WORKER + 1);

    let summary = &report.results.summary;
    assert_eq!(summary.failed, WORKERS * TESTS_PER_WORKER / 10);
    assert_eq!(summary.passed, tests.len() - summary.failed);

    let thread_ids: HashSet<_> = tests
        .iter()
        .filter_map(|test| test.thread_id.as_deref())
        .collect();
    assert_eq!(thread_ids.len(), WORKERS);

    // Attempts of the shared test see each other in completion order.
    let shared: Vec<_> = tests
        .iter()
        .filter(|test| test.name == "shared")
        .map(|test| (test.retries, test.flaky))
        .collect();
    let expected: Vec<_> = (0..WORKERS)
        .map(|index| {
            let retries = (index > 0).then(|| u32::try_from(index).unwrap());
            (retries, retries.map(|_| true))
        })
        .collect();
    assert_eq!(shared, expected);
    assert!(
        tests
            .iter()
            .filter(|test| test.name == "shared")
            .all(|test| test.status == Some(TestStatus::Passed))
    );

    assert!(report_path.is_file());
}
