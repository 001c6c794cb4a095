// Copyright (c) The ctrf-rs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generate and read Common Test Report Format (CTRF) documents in Rust.
//!
//! The root type is [`Report`]. Reports are serialized as JSON, following the schema published at
//! <https://ctrf.io>.

#![warn(missing_docs)]

mod errors;
mod report;
mod serialize;

pub use errors::*;
pub use report::*;
