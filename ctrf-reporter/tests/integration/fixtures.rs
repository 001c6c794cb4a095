// Copyright (c) The ctrf-rs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8Path;
use camino_tempfile::Utf8TempDir;
use ctrf_model::{Report, Results, Summary, Test, TestStatus, Tool};
use ctrf_reporter::{
    config::CtrfConfig,
    reporter::ReportAggregator,
    store::{ReportStorage, ReportStore},
    time::ManualClock,
};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

pub(crate) type TestAggregator = ReportAggregator<CountingStore, Arc<ManualClock>>;

pub(crate) fn test_init() {
    // Ignore errors: another test may have set the subscriber already.
    _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A [`ReportStore`] that counts how many times a report was written.
#[derive(Debug)]
pub(crate) struct CountingStore {
    inner: ReportStore,
    writes: AtomicUsize,
}

impl CountingStore {
    pub(crate) fn new(inner: ReportStore) -> Self {
        Self {
            inner,
            writes: AtomicUsize::new(0),
        }
    }

    pub(crate) fn inner(&self) -> &ReportStore {
        &self.inner
    }

    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl ReportStorage for CountingStore {
    fn existing_start_time(&self) -> Option<i64> {
        self.inner.existing_start_time()
    }

    fn existing_tests(&self) -> Vec<Test> {
        self.inner.existing_tests()
    }

    fn write_results_to_file(&self, report: &Report) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write_results_to_file(report);
    }
}

/// An aggregator writing to `ctrf-report.json` in a temporary directory.
pub(crate) struct Harness {
    pub(crate) dir: Utf8TempDir,
    pub(crate) clock: Arc<ManualClock>,
    pub(crate) aggregator: TestAggregator,
}

impl Harness {
    pub(crate) fn new(now: i64) -> Self {
        Self::with_overrides(now, [])
    }

    pub(crate) fn with_overrides<'a>(
        now: i64,
        overrides: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        test_init();

        let dir = Utf8TempDir::new().expect("created temp dir");
        let config = CtrfConfig::from_sources_with_env(dir.path(), None, Vec::new(), overrides)
            .expect("valid config");
        let clock = Arc::new(ManualClock::new(now));
        let aggregator = ReportAggregator::with_parts(
            &config,
            CountingStore::new(ReportStore::new(config.report_path())),
            clock.clone(),
        );
        Self {
            dir,
            clock,
            aggregator,
        }
    }

    pub(crate) fn report_path(&self) -> &Utf8Path {
        self.aggregator.store().inner().path()
    }

    /// Reads back the report written to disk.
    pub(crate) fn written_report(&self) -> Report {
        self.aggregator
            .store()
            .inner()
            .load()
            .expect("report is readable")
            .expect("report was written")
    }
}

/// Builds a report as an earlier shard would have written it.
pub(crate) fn earlier_report(start: i64, tests: &[(&str, TestStatus)]) -> Report {
    let mut summary = Summary::new(start, start + 100);
    let tests: Vec<_> = tests
        .iter()
        .enumerate()
        .map(|(index, (name, status))| {
            let offset = i64::try_from(index).expect("small index") * 10;
            let mut test = Test::new(*name);
            test.set_status(*status)
                .set_times(start + offset, start + offset + 5);
            summary.record(test.status);
            test
        })
        .collect();
    let mut results = Results::new(Tool::new("libtest"), summary);
    results.add_tests(tests);
    Report::new(results)
}
