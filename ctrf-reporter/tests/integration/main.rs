// Copyright (c) The ctrf-rs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

mod concurrency;
mod fixtures;
mod run;
