// Copyright (c) The ctrf-rs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// An error that occurs while serializing a [`Report`](crate::Report).
///
/// Returned by [`Report::serialize`](crate::Report::serialize) and
/// [`Report::to_string`](crate::Report::to_string).
#[derive(Debug, Error)]
#[error("error serializing CTRF report")]
pub struct SerializeError {
    #[from]
    inner: serde_json::Error,
}

/// An error that occurs while deserializing a [`Report`](crate::Report).
///
/// Returned by [`Report::deserialize_from`](crate::Report::deserialize_from) and the
/// [`FromStr`](std::str::FromStr) implementation.
#[derive(Debug, Error)]
#[error("error deserializing CTRF report")]
pub struct DeserializeError {
    #[from]
    inner: serde_json::Error,
}

/// An error returned while parsing a [`TestStatus`](crate::TestStatus) from a string.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error(
    "unrecognized test status: {input}\n(known values: {})",
    crate::TestStatus::variants().join(", "),
)]
pub struct TestStatusParseError {
    input: String,
}

impl TestStatusParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}
