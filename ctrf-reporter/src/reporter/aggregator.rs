// Copyright (c) The ctrf-rs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The shared state of a test run, and the events that update it.

use super::{
    composer::ReportComposer,
    events::{
        FailureCause, SuiteContext, TestDescriptor, TestDetails, TestEvent, TestHandle,
        TestOutcome,
    },
    processor::TestProcessor,
    summary::create_summary,
    suite_failure::SuiteFailureHandler,
};
use crate::{
    config::CtrfConfig,
    store::{ReportStorage, ReportStore},
    time::{Clock, SystemClock},
};
use ctrf_model::{Report, Test, TestStatus};
use std::{
    collections::HashMap,
    mem,
    sync::{
        Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
        atomic::{AtomicBool, AtomicI64, Ordering},
    },
};
use tracing::{debug, warn};

/// Aggregates test events from a possibly concurrent test run into a CTRF report.
///
/// All methods take `&self`, so an aggregator can be shared between worker threads (for example
/// behind an `Arc`). None of them return errors or panic on bad input: problems are logged and the
/// run carries on.
///
/// Tests are recorded in the order they finish. A run is bracketed by
/// [`start_test_run`](Self::start_test_run) and [`finish_test_run`](Self::finish_test_run); both
/// are one-shot transitions, so duplicate calls are ignored.
#[derive(Debug)]
pub struct ReportAggregator<S = ReportStore, C = SystemClock> {
    tests: RwLock<Vec<Test>>,
    in_flight: Mutex<HashMap<TestHandle, TestDetails>>,
    run_start: AtomicI64,
    started: AtomicBool,
    processor: TestProcessor,
    suite_failure: SuiteFailureHandler,
    composer: ReportComposer,
    store: S,
    clock: C,
}

impl ReportAggregator {
    /// Creates a new aggregator that writes to the report path in `config`.
    pub fn new(config: &CtrfConfig) -> Self {
        Self::with_parts(config, ReportStore::new(config.report_path()), SystemClock)
    }
}

impl<S: ReportStorage, C: Clock> ReportAggregator<S, C> {
    /// Creates a new aggregator with the given storage and clock.
    pub fn with_parts(config: &CtrfConfig, store: S, clock: C) -> Self {
        let processor = TestProcessor::from_config(config);
        Self {
            tests: RwLock::new(Vec::new()),
            in_flight: Mutex::new(HashMap::new()),
            run_start: AtomicI64::new(0),
            started: AtomicBool::new(false),
            suite_failure: SuiteFailureHandler::new(processor.clone()),
            processor,
            composer: ReportComposer::from_config(config),
            store,
            clock,
        }
    }

    /// Returns the storage backing this aggregator.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns true between a call to `start_test_run` and the matching `finish_test_run`.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Returns a snapshot of the tests recorded so far, in completion order.
    pub fn tests(&self) -> Vec<Test> {
        self.read_tests().clone()
    }

    /// Dispatches a harness event to the matching method.
    pub fn write_event(&self, event: TestEvent) {
        match event {
            TestEvent::RunStarted => self.start_test_run(),
            TestEvent::TestStarted { test } => self.on_test_start(test),
            TestEvent::TestSkipped { test, reason } => self.on_test_skipped(test, reason),
            TestEvent::TestFinished { handle, outcome } => match outcome {
                TestOutcome::Passed => self.on_test_success(&handle),
                TestOutcome::Failed(cause) => self.on_test_failure(&handle, cause.as_ref()),
                TestOutcome::Aborted(cause) => self.on_test_aborted(&handle, cause.as_ref()),
            },
            TestEvent::RunFinished { context } => {
                self.finish_test_run(context.as_ref());
            }
        }
    }

    /// Records that a test started.
    ///
    /// If a test with the same handle is already in flight, it is replaced.
    pub fn on_test_start(&self, test: TestDescriptor) {
        let now = self.clock.now_millis();
        let handle = test.handle.clone();
        let details = TestDetails::from_descriptor(test, now);
        if self.lock_in_flight().insert(handle, details).is_some() {
            debug!("test started twice, keeping the later start");
        }
    }

    /// Records a test that was skipped without being started.
    ///
    /// The reason, if any, is stored as the test's message.
    pub fn on_test_skipped(&self, test: TestDescriptor, reason: Option<String>) {
        let now = self.clock.now_millis();
        let details = TestDetails::from_descriptor(test, now);

        let mut record = self.processor.create_test(details.name(), &details, now);
        record.set_status(TestStatus::Skipped);
        if let Some(reason) = reason {
            record.set_message(reason);
        }
        self.write_tests().push(record);
    }

    /// Records that a test passed.
    pub fn on_test_success(&self, handle: &TestHandle) {
        self.process_test_result(handle, TestStatus::Passed, None);
    }

    /// Records that a test failed.
    pub fn on_test_failure(&self, handle: &TestHandle, cause: Option<&FailureCause>) {
        self.process_test_result(handle, TestStatus::Failed, cause);
    }

    /// Records that a test was aborted. Aborted tests are reported as failed.
    pub fn on_test_aborted(&self, handle: &TestHandle, cause: Option<&FailureCause>) {
        self.process_test_result(handle, TestStatus::Failed, cause);
    }

    /// Starts the run, merging in tests from a report left by an earlier run.
    ///
    /// Only the first call after construction (or after `finish_test_run`) has any effect.
    pub fn start_test_run(&self) {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("test run already started");
            return;
        }

        let run_start = self
            .store
            .existing_start_time()
            .unwrap_or_else(|| self.clock.now_millis());
        self.run_start.store(run_start, Ordering::SeqCst);

        let existing = self.store.existing_tests();
        debug!(
            run_start,
            existing_tests = existing.len(),
            "starting test run"
        );
        self.write_tests().extend(existing);
    }

    /// Finishes the run: adds a record for any suite-level failure, then writes the report.
    ///
    /// Returns the report that was written, or `None` if the run was not started.
    ///
    /// If no tests were recorded and `context` carries an error, an "Initialization Error" record
    /// is added. If tests were recorded and `context` carries an error, an "Execution Error"
    /// record is added, starting when the last recorded test stopped.
    pub fn finish_test_run(&self, context: Option<&SuiteContext>) -> Option<Report> {
        if self
            .started
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("test run not started, nothing to finish");
            return None;
        }

        let run_start = self.run_start.load(Ordering::SeqCst);
        let run_stop = self.clock.now_millis();
        let mut tests = mem::take(&mut *self.write_tests());
        let discarded = mem::take(&mut *self.lock_in_flight()).len();
        if discarded > 0 {
            debug!(discarded, "discarding tests that started but never finished");
        }

        if let Some(context) = context {
            let suite_failure = match tests.last() {
                None => self
                    .suite_failure
                    .handle_initialization_error(context, run_start, run_stop),
                Some(last) => {
                    let last_stop = last.stop.unwrap_or(run_start);
                    self.suite_failure
                        .handle_execution_error(context, last_stop, run_stop)
                }
            };
            tests.extend(suite_failure);
        }

        let summary = create_summary(&tests, run_start, run_stop);
        debug!(
            tests = summary.tests,
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            "finishing test run"
        );

        let report = self.composer.generate_report(summary, tests, run_stop);
        self.store.write_results_to_file(&report);
        Some(report)
    }

    // ---
    // Helper methods
    // ---

    fn process_test_result(
        &self,
        handle: &TestHandle,
        status: TestStatus,
        cause: Option<&FailureCause>,
    ) {
        if !self.is_started() {
            warn!(%handle, "test finished outside of a test run");
        }

        let stop = self.clock.now_millis();
        let details = self.lock_in_flight().remove(handle).unwrap_or_else(|| {
            warn!(%handle, "finished test was never started, recording it as unknown");
            TestDetails::unknown(stop)
        });

        let mut record = self.processor.create_test(details.name(), &details, stop);
        record.set_status(status);
        if let Some(cause) = cause {
            self.processor.set_failure_details(&mut record, cause);
        }

        // Hold the write lock across detection and append so that concurrent attempts of the
        // same test see each other.
        let mut tests = self.write_tests();
        mark_reruns(&tests, &mut record);
        tests.push(record);
    }

    fn read_tests(&self) -> RwLockReadGuard<'_, Vec<Test>> {
        self.tests.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_tests(&self) -> RwLockWriteGuard<'_, Vec<Test>> {
        self.tests.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<TestHandle, TestDetails>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sets `retries` and `flaky` on a newly finished test, based on earlier tests with the same name.
///
/// A passed test is flaky if an earlier attempt failed, or if there were any earlier attempts.
fn mark_reruns(previous: &[Test], test: &mut Test) {
    let earlier: Vec<&Test> = previous
        .iter()
        .filter(|earlier| earlier.name == test.name)
        .collect();
    if !earlier.is_empty() {
        test.set_retries(u32::try_from(earlier.len()).unwrap_or(u32::MAX));
    }

    if test.status == Some(TestStatus::Passed) {
        let had_earlier_failures = earlier
            .iter()
            .any(|earlier| earlier.status == Some(TestStatus::Failed));
        if had_earlier_failures || test.retries.is_some_and(|retries| retries > 0) {
            test.set_flaky(true);
        }
    }
}
