// Copyright (c) The ctrf-rs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Aggregates test events into a [Common Test Report Format](https://ctrf.io) report.
//!
//! A test harness adapter creates a [`ReportAggregator`](reporter::ReportAggregator) from a
//! [`CtrfConfig`](config::CtrfConfig), feeds it events as tests start and finish (possibly from
//! several threads at once), and finishes the run to write the report. Runs that share a report
//! path merge into one cumulative report, which lets sharded test processes produce a single
//! document.

pub mod config;
pub mod errors;
pub mod reporter;
pub mod store;
pub mod time;
