// Copyright (c) The ctrf-rs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    events::{SuiteContext, TestDetails},
    processor::TestProcessor,
};
use ctrf_model::{Test, TestStatus};
use tracing::debug;

/// Builds synthetic records for failures that happen outside any individual test.
#[derive(Clone, Debug)]
pub struct SuiteFailureHandler {
    processor: TestProcessor,
}

impl SuiteFailureHandler {
    /// The name of the record emitted when a run produced no tests at all.
    pub const INITIALIZATION_ERROR: &'static str = "Initialization Error";

    /// The name of the record emitted when a run failed after some tests completed.
    pub const EXECUTION_ERROR: &'static str = "Execution Error";

    /// Creates a new handler.
    pub fn new(processor: TestProcessor) -> Self {
        Self { processor }
    }

    /// Returns a failed "Initialization Error" record spanning `start` to `stop`, if `context`
    /// carries a suite-level error.
    pub fn handle_initialization_error(
        &self,
        context: &SuiteContext,
        start: i64,
        stop: i64,
    ) -> Option<Test> {
        self.failure_record(Self::INITIALIZATION_ERROR, context, start, stop)
    }

    /// Returns a failed "Execution Error" record spanning `start` to `stop`, if `context`
    /// carries a suite-level error.
    pub fn handle_execution_error(
        &self,
        context: &SuiteContext,
        start: i64,
        stop: i64,
    ) -> Option<Test> {
        self.failure_record(Self::EXECUTION_ERROR, context, start, stop)
    }

    fn failure_record(
        &self,
        name: &str,
        context: &SuiteContext,
        start: i64,
        stop: i64,
    ) -> Option<Test> {
        let cause = context.execution_error()?;
        debug!(name, "recording suite-level failure");

        let details = TestDetails {
            display_name: Some(name.to_owned()),
            ..TestDetails::unknown(start)
        };
        let mut test = self.processor.create_test(name, &details, stop);
        // Not tied to any worker thread.
        test.thread_id = None;
        test.set_status(TestStatus::Failed);
        self.processor.set_failure_details(&mut test, cause);
        Some(test)
    }
}
