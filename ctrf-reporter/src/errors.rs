// Copyright (c) The ctrf-rs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by ctrf-reporter.
//!
//! Errors in this module are returned by the fallible building blocks (config parsing, loading and
//! writing reports). The [`ReportAggregator`](crate::reporter::ReportAggregator) never returns
//! them to the test harness: it logs them and carries on.

use camino::Utf8PathBuf;
use config::ConfigError;
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse ctrf config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file that failed to parse.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error that occurred.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing the config.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),
}

/// An error that occurred while loading a previously written report.
#[derive(Debug, Error)]
pub enum LoadReportError {
    /// Error reading the report file.
    #[error("failed to read report file at {path}")]
    ReadError {
        /// The path that failed to be read.
        path: Utf8PathBuf,
        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// Error deserializing the report.
    #[error("failed to deserialize report at {path}")]
    DeserializeError {
        /// The path that failed to be deserialized.
        path: Utf8PathBuf,
        /// The underlying deserialization error.
        #[source]
        error: ctrf_model::DeserializeError,
    },
}

/// An error that occurred while writing a report.
#[derive(Debug, Error)]
pub enum WriteReportError {
    /// Error creating the parent directory.
    #[error("failed to create directory {path}")]
    CreateDirError {
        /// The directory path that failed to be created.
        path: Utf8PathBuf,
        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// Error serializing the report.
    #[error("failed to serialize report")]
    SerializeError {
        /// The underlying serialization error.
        #[source]
        error: ctrf_model::SerializeError,
    },

    /// Access to the report path was denied.
    #[error("access denied: {path}")]
    PermissionDenied {
        /// The path that could not be written.
        path: Utf8PathBuf,
        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// Error writing the report to disk.
    #[error("failed to write report to {path}")]
    WriteError {
        /// The path that failed to be written.
        path: Utf8PathBuf,
        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },
}

impl WriteReportError {
    pub(crate) fn from_io(path: Utf8PathBuf, error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied { path, error }
        } else {
            Self::WriteError { path, error }
        }
    }
}
