// Copyright (c) The ctrf-rs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Events fed into the [`ReportAggregator`](super::ReportAggregator) by a test harness adapter.
//!
//! Adapters can either call the per-test methods on the aggregator directly, or translate their
//! framework's notifications into [`TestEvent`]s and pass them to
//! [`ReportAggregator::write_event`](super::ReportAggregator::write_event). Both routes behave
//! identically.

use indexmap::IndexSet;
use std::{any::Any, error::Error, fmt};

/// An opaque identifier for one execution of a test, supplied by the test framework.
///
/// Two executions of the same test (for example a retry) have different handles.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TestHandle(String);

impl TestHandle {
    /// Creates a new handle.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the handle as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TestHandle {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TestHandle {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// What an adapter knows about a test when it starts or is skipped.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestDescriptor {
    /// The handle of this execution.
    pub handle: TestHandle,

    /// The name shown in the report.
    pub display_name: String,

    /// Tags attached to the test, in declaration order.
    pub tags: IndexSet<String>,

    /// The file or logical grouping the test belongs to.
    pub file_path: Option<String>,
}

impl TestDescriptor {
    /// Creates a new descriptor with no tags and no file path.
    pub fn new(handle: impl Into<TestHandle>, display_name: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            display_name: display_name.into(),
            tags: IndexSet::new(),
            file_path: None,
        }
    }

    /// Adds tags to the descriptor.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Sets the file path.
    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }
}

/// The in-flight record for a test that has started but not yet finished.
///
/// Created when a test starts and consumed when its terminal event arrives. If the terminal event
/// never arrives, the details are dropped and no record is emitted for the test.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestDetails {
    /// When the test started, in milliseconds since the Unix epoch.
    pub start_time: i64,

    /// Tags attached to the test.
    pub tags: IndexSet<String>,

    /// The file or logical grouping the test belongs to.
    pub file_path: Option<String>,

    /// The handle of this execution, if known.
    pub unique_id: Option<TestHandle>,

    /// The name shown in the report, if known.
    pub display_name: Option<String>,
}

impl TestDetails {
    /// The name used for a test whose start was never observed.
    pub const UNKNOWN_TEST_NAME: &'static str = "Unknown Test";

    /// Creates details for a test described by `descriptor` that started at `start_time`.
    pub fn from_descriptor(descriptor: TestDescriptor, start_time: i64) -> Self {
        let TestDescriptor {
            handle,
            display_name,
            tags,
            file_path,
        } = descriptor;
        Self {
            start_time,
            tags,
            file_path,
            unique_id: Some(handle),
            display_name: Some(display_name),
        }
    }

    /// Creates placeholder details for a test whose start was never observed.
    pub fn unknown(start_time: i64) -> Self {
        Self {
            start_time,
            tags: IndexSet::new(),
            file_path: None,
            unique_id: None,
            display_name: Some(Self::UNKNOWN_TEST_NAME.to_owned()),
        }
    }

    /// Returns the name to use in the report.
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or(Self::UNKNOWN_TEST_NAME)
    }
}

/// The cause of a test or suite failure, rendered as text.
///
/// The rendered trace is stored in full in a test's `trace` field, and a possibly truncated copy
/// in its `message` field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FailureCause {
    trace: String,
}

impl FailureCause {
    /// Creates a cause from an already rendered trace.
    pub fn new(trace: impl Into<String>) -> Self {
        Self {
            trace: trace.into(),
        }
    }

    /// Renders an error and its chain of sources.
    ///
    /// The first line is the error itself; each source follows on its own indented line after a
    /// `Caused by:` header.
    pub fn from_error(error: &dyn Error) -> Self {
        let mut trace = error.to_string();

        let mut source = error.source();
        if source.is_some() {
            trace.push_str("\nCaused by:");
        }
        while let Some(error) = source {
            trace.push_str("\n  ");
            trace.push_str(&error.to_string());
            source = error.source();
        }

        Self { trace }
    }

    /// Renders the payload of a panic, as caught by [`std::panic::catch_unwind`].
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_owned()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "Box<dyn Any>".to_owned()
        };
        Self {
            trace: format!("panicked: {message}"),
        }
    }

    /// Returns the full rendered trace.
    pub fn trace(&self) -> &str {
        &self.trace
    }
}

/// Context supplied by the harness when a run finishes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SuiteContext {
    execution_error: Option<FailureCause>,
}

impl SuiteContext {
    /// Creates a context for a run that finished without a suite-level error.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context for a run that failed outside of any individual test.
    pub fn with_execution_error(cause: FailureCause) -> Self {
        Self {
            execution_error: Some(cause),
        }
    }

    /// Returns the suite-level error, if any.
    pub fn execution_error(&self) -> Option<&FailureCause> {
        self.execution_error.as_ref()
    }
}

/// The terminal outcome of a test execution.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TestOutcome {
    /// The test passed.
    Passed,

    /// The test failed.
    Failed(Option<FailureCause>),

    /// The test was aborted, for example because an assumption did not hold. Reported as a
    /// failure.
    Aborted(Option<FailureCause>),
}

/// A notification from a test harness.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TestEvent {
    /// The test run started.
    RunStarted,

    /// A test started.
    TestStarted {
        /// The test that started.
        test: TestDescriptor,
    },

    /// A test was skipped without being started.
    TestSkipped {
        /// The test that was skipped.
        test: TestDescriptor,

        /// Why the test was skipped.
        reason: Option<String>,
    },

    /// A test reached a terminal outcome.
    TestFinished {
        /// The handle passed in with [`TestEvent::TestStarted`].
        handle: TestHandle,

        /// The outcome of the test.
        outcome: TestOutcome,
    },

    /// The test run finished.
    RunFinished {
        /// Suite-level context, if the harness has any.
        context: Option<SuiteContext>,
    },
}
