// Copyright (c) The ctrf-rs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::events::{FailureCause, TestDetails};
use crate::config::CtrfConfig;
use ctrf_model::Test;
use std::thread;

/// Turns in-flight test details into report records.
#[derive(Clone, Debug)]
pub struct TestProcessor {
    max_message_length: usize,
}

impl TestProcessor {
    /// The suffix appended to a truncated message.
    pub const TRUNCATION_SUFFIX: &'static str = "...";

    /// Creates a new processor that truncates messages to `max_message_length` characters.
    pub fn new(max_message_length: usize) -> Self {
        Self { max_message_length }
    }

    /// Creates a new processor from the config.
    pub fn from_config(config: &CtrfConfig) -> Self {
        Self::new(config.max_message_length())
    }

    /// Returns the maximum message length in characters, not counting the truncation suffix.
    pub fn max_message_length(&self) -> usize {
        self.max_message_length
    }

    /// Creates a record for a test that stopped at `stop`.
    ///
    /// The status is left unset. The record is tagged with the current thread.
    pub fn create_test(&self, name: &str, details: &TestDetails, stop: i64) -> Test {
        let mut test = Test::new(name);
        test.set_times(details.start_time, stop)
            .set_tags(details.tags.iter().cloned())
            .set_thread_id(current_thread_id());
        if let Some(file_path) = &details.file_path {
            test.set_filepath(file_path.clone());
        }
        test
    }

    /// Records a failure cause on `test`.
    ///
    /// The full text goes into `trace`. `message` holds at most `max_message_length` characters,
    /// followed by `...` if anything was cut off.
    pub fn set_failure_details(&self, test: &mut Test, cause: &FailureCause) {
        let trace = cause.trace();
        test.set_message(truncate_message(trace, self.max_message_length));
        test.set_trace(trace);
    }
}

fn truncate_message(message: &str, max_chars: usize) -> String {
    match message.char_indices().nth(max_chars) {
        Some((end, _)) => {
            let mut truncated = message[..end].to_owned();
            truncated.push_str(TestProcessor::TRUNCATION_SUFFIX);
            truncated
        }
        None => message.to_owned(),
    }
}

fn current_thread_id() -> String {
    let current = thread::current();
    match current.name() {
        Some(name) => name.to_owned(),
        None => format!("{:?}", current.id()),
    }
}
