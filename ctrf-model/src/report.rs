// Copyright (c) The ctrf-rs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{DeserializeError, SerializeError, TestStatusParseError},
    serialize::{deserialize_lenient_status, report_from_value, serialize_status},
};
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{fmt, io, str::FromStr};
use uuid::Uuid;

/// The version of the CTRF specification that reports produced by this crate conform to.
pub const SPEC_VERSION: &str = "0.0.0";

/// Free-form, tool-specific metadata attached to several CTRF objects.
///
/// Serialized as a JSON object. Insertion order is preserved.
pub type Extra = IndexMap<String, serde_json::Value>;

/// The root of a CTRF document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// The report format tag. Always `"CTRF"`.
    #[serde(default)]
    pub report_format: ReportFormat,

    /// The version of the CTRF specification this report follows.
    #[serde(default = "default_spec_version")]
    pub spec_version: String,

    /// A unique identifier for this report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_id: Option<Uuid>,

    /// The time at which this report was generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<FixedOffset>>,

    /// The name of the program that generated this report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_by: Option<String>,

    /// The results of the test run.
    pub results: Results,

    /// Other top-level metadata.
    #[serde(default, skip_serializing_if = "Extra::is_empty")]
    pub extra: Extra,
}

fn default_spec_version() -> String {
    SPEC_VERSION.to_owned()
}

impl Report {
    /// Creates a new `Report` wrapping the given results.
    pub fn new(results: Results) -> Self {
        Self {
            report_format: ReportFormat::Ctrf,
            spec_version: default_spec_version(),
            report_id: None,
            timestamp: None,
            generated_by: None,
            results,
            extra: Extra::new(),
        }
    }

    /// Sets the unique identifier for this report.
    pub fn set_report_id(&mut self, report_id: Uuid) -> &mut Self {
        self.report_id = Some(report_id);
        self
    }

    /// Sets the generation timestamp for this report.
    pub fn set_timestamp(&mut self, timestamp: impl Into<DateTime<FixedOffset>>) -> &mut Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Sets the name of the program that generated this report.
    pub fn set_generated_by(&mut self, generated_by: impl Into<String>) -> &mut Self {
        self.generated_by = Some(generated_by.into());
        self
    }

    /// Serialize this report to the given writer as pretty-printed JSON.
    pub fn serialize(&self, writer: impl io::Write) -> Result<(), SerializeError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Serialize this report to a string.
    pub fn to_string(&self) -> Result<String, SerializeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a report from the given reader.
    ///
    /// Tests with an unrecognized status keep it in `raw_status`, unless they already have one.
    pub fn deserialize_from(reader: impl io::Read) -> Result<Self, DeserializeError> {
        let value: serde_json::Value = serde_json::from_reader(reader)?;
        Ok(report_from_value(value)?)
    }
}

impl FromStr for Report {
    type Err = DeserializeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let value: serde_json::Value = serde_json::from_str(input)?;
        Ok(report_from_value(value)?)
    }
}

/// The `reportFormat` tag of a CTRF document.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum ReportFormat {
    /// The Common Test Report Format.
    #[default]
    #[serde(rename = "CTRF")]
    Ctrf,
}

/// The results of a test run: the tool that ran it, a summary, and individual tests.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Results {
    /// The tool that produced the results.
    pub tool: Tool,

    /// Aggregate statistics over `tests`.
    pub summary: Summary,

    /// The individual test results, in completion order.
    #[serde(default)]
    pub tests: Vec<Test>,

    /// Information about the environment the tests ran in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,

    /// Other metadata about the results.
    #[serde(default, skip_serializing_if = "Extra::is_empty")]
    pub extra: Extra,
}

impl Results {
    /// Creates a new `Results` with no tests.
    pub fn new(tool: Tool, summary: Summary) -> Self {
        Self {
            tool,
            summary,
            tests: vec![],
            environment: None,
            extra: Extra::new(),
        }
    }

    /// Adds tests to the results. Does not update the summary.
    pub fn add_tests(&mut self, tests: impl IntoIterator<Item = Test>) -> &mut Self {
        self.tests.extend(tests);
        self
    }

    /// Sets the environment. An empty environment is stored as `None`.
    pub fn set_environment(&mut self, environment: Environment) -> &mut Self {
        self.environment = (!environment.is_empty()).then_some(environment);
        self
    }
}

/// The tool that produced a report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// The name of the tool.
    pub name: String,

    /// The version of the tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Other metadata about the tool.
    #[serde(default, skip_serializing_if = "Extra::is_empty")]
    pub extra: Extra,
}

impl Tool {
    /// Creates a new `Tool` with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            extra: Extra::new(),
        }
    }

    /// Sets the version of the tool.
    pub fn set_version(&mut self, version: impl Into<String>) -> &mut Self {
        self.version = Some(version.into());
        self
    }
}

/// Aggregate statistics for a test run.
///
/// `tests` counts every test, including those without a status, so it can exceed the sum of the
/// per-status counts only when some tests carry no status.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// The total number of tests.
    pub tests: usize,

    /// The number of tests that passed.
    pub passed: usize,

    /// The number of tests that failed.
    pub failed: usize,

    /// The number of tests that were skipped.
    pub skipped: usize,

    /// The number of tests that are pending.
    pub pending: usize,

    /// The number of tests with some other status.
    pub other: usize,

    /// The number of suites, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suites: Option<usize>,

    /// The start of the run, in milliseconds since the Unix epoch.
    pub start: i64,

    /// The end of the run, in milliseconds since the Unix epoch.
    pub stop: i64,

    /// Other metadata about the run, such as the startup duration.
    #[serde(default, skip_serializing_if = "Extra::is_empty")]
    pub extra: Extra,
}

impl Summary {
    /// The `extra` key under which the startup duration is stored.
    pub const STARTUP_DURATION_KEY: &'static str = "startupDuration";

    /// Creates a new, empty `Summary` spanning `start` to `stop`.
    pub fn new(start: i64, stop: i64) -> Self {
        Self {
            start,
            stop,
            ..Default::default()
        }
    }

    /// Records a test with the given status, updating the counts.
    ///
    /// A test without a status counts toward `tests` only.
    pub fn record(&mut self, status: Option<TestStatus>) -> &mut Self {
        self.tests += 1;
        match status {
            Some(TestStatus::Passed) => self.passed += 1,
            Some(TestStatus::Failed) => self.failed += 1,
            Some(TestStatus::Skipped) => self.skipped += 1,
            Some(TestStatus::Pending) => self.pending += 1,
            Some(TestStatus::Other) => self.other += 1,
            None => {}
        }
        self
    }

    /// Sets the time between the start of the run and the start of the first test, in
    /// milliseconds.
    pub fn set_startup_duration(&mut self, millis: i64) -> &mut Self {
        self.extra
            .insert(Self::STARTUP_DURATION_KEY.to_owned(), millis.into());
        self
    }

    /// Returns the startup duration, if set.
    pub fn startup_duration(&self) -> Option<i64> {
        self.extra
            .get(Self::STARTUP_DURATION_KEY)
            .and_then(|value| value.as_i64())
    }
}

/// A single test result.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Test {
    /// The name of the test.
    pub name: String,

    /// The outcome of the test.
    ///
    /// Unrecognized statuses in a deserialized report are read as `None`, with the original string
    /// kept in `raw_status`. A test without a status is written as `other`.
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_status",
        serialize_with = "serialize_status"
    )]
    pub status: Option<TestStatus>,

    /// The time taken by the test, in milliseconds.
    #[serde(default)]
    pub duration: i64,

    /// The time at which the test started, in milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,

    /// The time at which the test stopped, in milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<i64>,

    /// The suite the test belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suite: Option<String>,

    /// A possibly truncated failure or skip message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// The full failure trace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,

    /// The line number of the test in its file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,

    /// The status as reported by the underlying test framework.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_status: Option<String>,

    /// Tags attached to the test.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// The kind of test, e.g. "unit" or "integration".
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub test_type: Option<String>,

    /// The file (or logical location) the test is defined in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filepath: Option<String>,

    /// The number of earlier attempts of a test with the same name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,

    /// Whether the test passed after earlier attempts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flaky: Option<bool>,

    /// The thread the test finished on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,

    /// Parameters of a parameterized test.
    #[serde(default, skip_serializing_if = "Extra::is_empty")]
    pub parameters: Extra,

    /// Individual steps within the test.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,

    /// Other metadata about the test.
    #[serde(default, skip_serializing_if = "Extra::is_empty")]
    pub extra: Extra,
}

impl Test {
    /// Creates a new test with the given name and no status.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the status of the test.
    pub fn set_status(&mut self, status: TestStatus) -> &mut Self {
        self.status = Some(status);
        self
    }

    /// Sets the start and stop times of the test, and the duration derived from them.
    pub fn set_times(&mut self, start: i64, stop: i64) -> &mut Self {
        self.start = Some(start);
        self.stop = Some(stop);
        self.duration = stop - start;
        self
    }

    /// Sets the suite of the test.
    pub fn set_suite(&mut self, suite: impl Into<String>) -> &mut Self {
        self.suite = Some(suite.into());
        self
    }

    /// Sets the message.
    pub fn set_message(&mut self, message: impl Into<String>) -> &mut Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the trace.
    pub fn set_trace(&mut self, trace: impl Into<String>) -> &mut Self {
        self.trace = Some(trace.into());
        self
    }

    /// Sets the tags, preserving their order.
    pub fn set_tags(&mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the file path.
    pub fn set_filepath(&mut self, filepath: impl Into<String>) -> &mut Self {
        self.filepath = Some(filepath.into());
        self
    }

    /// Sets the number of earlier attempts.
    pub fn set_retries(&mut self, retries: u32) -> &mut Self {
        self.retries = Some(retries);
        self
    }

    /// Sets whether the test is flaky.
    pub fn set_flaky(&mut self, flaky: bool) -> &mut Self {
        self.flaky = Some(flaky);
        self
    }

    /// Sets the thread identifier.
    pub fn set_thread_id(&mut self, thread_id: impl Into<String>) -> &mut Self {
        self.thread_id = Some(thread_id.into());
        self
    }
}

/// The outcome of a test.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// The test passed.
    Passed,

    /// The test failed. Aborted tests are also reported as failed.
    Failed,

    /// The test was not run.
    Skipped,

    /// The test is pending.
    Pending,

    /// Any other outcome.
    Other,
}

impl TestStatus {
    /// String representations of all known variants.
    pub fn variants() -> &'static [&'static str] {
        &["passed", "failed", "skipped", "pending", "other"]
    }

    /// Returns the string representation of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::Skipped => "skipped",
            TestStatus::Pending => "pending",
            TestStatus::Other => "other",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestStatus {
    type Err = TestStatusParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let status = match input {
            "passed" => TestStatus::Passed,
            "failed" => TestStatus::Failed,
            "skipped" => TestStatus::Skipped,
            "pending" => TestStatus::Pending,
            "other" => TestStatus::Other,
            other => return Err(TestStatusParseError::new(other)),
        };
        Ok(status)
    }
}

/// A step within a test.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// The name of the step.
    pub name: String,

    /// The outcome of the step.
    pub status: TestStatus,

    /// Other metadata about the step.
    #[serde(default, skip_serializing_if = "Extra::is_empty")]
    pub extra: Extra,
}

/// Information about the environment a report was produced in.
///
/// Every field is optional; unset fields are omitted from the JSON.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    /// The name of the report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_name: Option<String>,

    /// The name of the application under test.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    /// The version of the application under test.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,

    /// The name of the build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_name: Option<String>,

    /// The number of the build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_number: Option<String>,

    /// A link to the build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_url: Option<String>,

    /// The name of the source repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_name: Option<String>,

    /// A link to the source repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,

    /// The commit the tests ran against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,

    /// The branch the tests ran against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,

    /// The operating system platform, e.g. "linux".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_platform: Option<String>,

    /// The operating system release.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_release: Option<String>,

    /// The operating system version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,

    /// The environment the tests ran in, e.g. "staging".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_environment: Option<String>,


    /// Other metadata about the environment.
    #[serde(default, skip_serializing_if = "Extra::is_empty")]
    pub extra: Extra,
}

impl Environment {
    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        // Use the destructuring syntax to ensure that all fields are handled.
        let Environment {
            report_name,
            app_name,
            app_version,
            build_name,
            build_number,
            build_url,
            repository_name,
            repository_url,
            commit,
            branch_name,
            os_platform,
            os_release,
            os_version,
            test_environment,
            extra,
        } = self;

        [
            report_name,
            app_name,
            app_version,
            build_name,
            build_number,
            build_url,
            repository_name,
            repository_url,
            commit,
            branch_name,
            os_platform,
            os_release,
            os_version,
            test_environment,
        ]
        .iter()
        .all(|field| field.is_none())
            && extra.is_empty()
    }
}
