// Copyright (c) The ctrf-rs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn test events into CTRF reports.
//!
//! The main type here is [`ReportAggregator`], which owns the state of a run. The other types are
//! the building blocks it delegates to, exposed for adapters that need finer control.

mod aggregator;
mod composer;
mod events;
mod processor;
mod suite_failure;
mod summary;

pub use aggregator::*;
pub use composer::*;
pub use events::*;
pub use processor::*;
pub use suite_failure::*;
pub use summary::*;
