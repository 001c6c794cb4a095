// Copyright (c) The ctrf-rs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading and writing CTRF reports on disk.
//!
//! A run merges into the report left at its output path by an earlier run, then overwrites it when
//! it finishes. Storage problems never fail the test run: the [`ReportStorage`] methods log errors
//! and fall back to empty values.

use crate::errors::{LoadReportError, WriteReportError};
use camino::{Utf8Path, Utf8PathBuf};
use ctrf_model::{Report, Test};
use display_error_chain::DisplayErrorChain;
use std::{fs, io, io::Write};
use tracing::{debug, error, warn};

/// Where finished reports are written and earlier reports are read from.
pub trait ReportStorage: Send + Sync {
    /// Returns `summary.start` of the existing report, if there is a readable one.
    fn existing_start_time(&self) -> Option<i64>;

    /// Returns the tests of the existing report, or an empty list if there is no readable one.
    fn existing_tests(&self) -> Vec<Test>;

    /// Writes `report`, replacing any existing report. Errors are logged, not returned.
    fn write_results_to_file(&self, report: &Report);
}

/// Stores the report as pretty-printed JSON at a fixed path.
#[derive(Clone, Debug)]
pub struct ReportStore {
    path: Utf8PathBuf,
}

impl ReportStore {
    /// Creates a new store for the given path.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the report.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Loads the report from disk, returning `None` if there is no file.
    pub fn load(&self) -> Result<Option<Report>, LoadReportError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let report: Report =
                    contents
                        .parse()
                        .map_err(|error| LoadReportError::DeserializeError {
                            path: self.path.clone(),
                            error,
                        })?;
                Ok(Some(report))
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(LoadReportError::ReadError {
                path: self.path.clone(),
                error,
            }),
        }
    }

    /// Saves the report to disk, creating parent directories as needed.
    pub fn save(&self, report: &Report) -> Result<(), WriteReportError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|error| WriteReportError::CreateDirError {
                path: parent.to_owned(),
                error,
            })?;
        }

        if self.path.exists() {
            warn!(path = %self.path, "overwriting existing CTRF report");
        }

        let contents = report
            .to_string()
            .map_err(|error| WriteReportError::SerializeError { error })?;

        atomicwrites::AtomicFile::new(&self.path, atomicwrites::AllowOverwrite)
            .write(|file| file.write_all(contents.as_bytes()))
            .map_err(|error| {
                let error = match error {
                    atomicwrites::Error::Internal(error) | atomicwrites::Error::User(error) => {
                        error
                    }
                };
                WriteReportError::from_io(self.path.clone(), error)
            })?;

        debug!(path = %self.path, tests = report.results.tests.len(), "wrote CTRF report");
        Ok(())
    }

    fn load_or_log(&self) -> Option<Report> {
        match self.load() {
            Ok(Some(report)) => Some(report),
            Ok(None) => {
                debug!(path = %self.path, "no existing CTRF report");
                None
            }
            Err(error) => {
                warn!(
                    "ignoring existing CTRF report: {}",
                    DisplayErrorChain::new(&error)
                );
                None
            }
        }
    }
}

impl ReportStorage for ReportStore {
    fn existing_start_time(&self) -> Option<i64> {
        self.load_or_log().map(|report| report.results.summary.start)
    }

    fn existing_tests(&self) -> Vec<Test> {
        self.load_or_log()
            .map(|report| report.results.tests)
            .unwrap_or_default()
    }

    fn write_results_to_file(&self, report: &Report) {
        if let Err(error) = self.save(report) {
            error!("failed to write CTRF report: {}", DisplayErrorChain::new(&error));
        }
    }
}
