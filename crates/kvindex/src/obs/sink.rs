//! Metrics sink boundary.
//!
//! Core index logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use crate::obs::metrics::{self, EventReport};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent<'a> {
    IndexDelta {
        namespace: &'a str,
        inserts: u64,
        removes: u64,
    },
    RowsScanned {
        namespace: &'a str,
        rows: u64,
    },
    /// A hash collision or prefix false positive dropped by re-verification.
    CandidateRejected {
        namespace: &'a str,
    },
    BlockSplit {
        namespace: &'a str,
    },
    BreakpointSplit {
        namespace: &'a str,
        splits: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent<'_>);
}

/// GlobalMetricsSink
/// Default process-local sink that writes into global metrics state.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::IndexDelta {
                namespace,
                inserts,
                removes,
            } => metrics::bump(namespace, |c| {
                c.index_inserts = c.index_inserts.saturating_add(inserts);
                c.index_removes = c.index_removes.saturating_add(removes);
            }),
            MetricsEvent::RowsScanned { namespace, rows } => metrics::bump(namespace, |c| {
                c.rows_scanned = c.rows_scanned.saturating_add(rows);
            }),
            MetricsEvent::CandidateRejected { namespace } => metrics::bump(namespace, |c| {
                c.candidates_rejected = c.candidates_rejected.saturating_add(1);
            }),
            MetricsEvent::BlockSplit { namespace } => metrics::bump(namespace, |c| {
                c.block_splits = c.block_splits.saturating_add(1);
            }),
            MetricsEvent::BreakpointSplit { namespace, splits } => {
                metrics::bump(namespace, |c| {
                    c.breakpoint_splits = c.breakpoint_splits.saturating_add(splits);
                });
            }
        }
    }
}

pub(crate) fn record(event: MetricsEvent<'_>) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match sink {
        Some(sink) => sink.record(event),
        None => GlobalMetricsSink.record(event),
    }
}

/// Snapshot the current metrics state.
#[must_use]
pub fn metrics_report() -> EventReport {
    metrics::report()
}

/// Reset all metrics counters.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obs::metrics::NamespaceCounters;

    #[derive(Default)]
    struct Capture(RefCell<Vec<String>>);

    impl MetricsSink for Capture {
        fn record(&self, event: MetricsEvent<'_>) {
            self.0.borrow_mut().push(format!("{event:?}"));
        }
    }

    #[test]
    fn override_captures_and_restores() {
        metrics_reset_all();
        let capture = Rc::new(Capture::default());

        with_metrics_sink(capture.clone(), || {
            record(MetricsEvent::BlockSplit { namespace: "ns" });
        });
        record(MetricsEvent::BlockSplit { namespace: "ns" });

        assert_eq!(capture.0.borrow().len(), 1);
        assert_eq!(metrics_report().namespace("ns").block_splits, 1);
    }

    #[test]
    fn index_delta_accumulates_per_namespace() {
        metrics_reset_all();
        record(MetricsEvent::IndexDelta {
            namespace: "a",
            inserts: 2,
            removes: 1,
        });
        record(MetricsEvent::IndexDelta {
            namespace: "b",
            inserts: 1,
            removes: 0,
        });

        let report = metrics_report();
        assert_eq!(report.ops.index_inserts, 3);
        assert_eq!(report.namespace("a").index_removes, 1);
        assert_eq!(report.namespace("missing"), NamespaceCounters::default());
    }
}
