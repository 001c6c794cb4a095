// Copyright (c) The ctrf-rs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::summary::process_startup_duration;
use crate::config::{CtrfConfig, EnvironmentConfig};
use chrono::{DateTime, Utc};
use ctrf_model::{Environment, Report, Results, Summary, Test, Tool};
use uuid::Uuid;

/// Assembles the final CTRF document.
#[derive(Clone, Debug)]
pub struct ReportComposer {
    tool_name: String,
    tool_version: Option<String>,
    environment: EnvironmentConfig,
    calculate_startup_duration: bool,
}

impl ReportComposer {
    /// The value written to the report's `generatedBy` field.
    pub const GENERATED_BY: &'static str = "ctrf-reporter";

    /// Creates a new composer from the config.
    pub fn from_config(config: &CtrfConfig) -> Self {
        Self {
            tool_name: config.tool_name().to_owned(),
            tool_version: config.tool_version().map(ToOwned::to_owned),
            environment: config.environment().clone(),
            calculate_startup_duration: config.calculate_startup_duration(),
        }
    }

    /// Builds a report from a computed summary and the final list of tests.
    ///
    /// `generated_at` is the report timestamp, in milliseconds since the Unix epoch.
    pub fn generate_report(
        &self,
        mut summary: Summary,
        tests: Vec<Test>,
        generated_at: i64,
    ) -> Report {
        if self.calculate_startup_duration {
            process_startup_duration(&mut summary, &tests);
        }

        let mut tool = Tool::new(&self.tool_name);
        if let Some(version) = &self.tool_version {
            tool.set_version(version);
        }

        let mut results = Results::new(tool, summary);
        results
            .add_tests(tests)
            .set_environment(to_environment(&self.environment));

        let mut report = Report::new(results);
        report
            .set_report_id(Uuid::new_v4())
            .set_generated_by(Self::GENERATED_BY);
        if let Some(timestamp) = DateTime::<Utc>::from_timestamp_millis(generated_at) {
            report.set_timestamp(timestamp);
        }
        report
    }
}

fn to_environment(config: &EnvironmentConfig) -> Environment {
    let EnvironmentConfig {
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
    } = config.clone();

    Environment {
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
        extra: Default::default(),
    }
}
