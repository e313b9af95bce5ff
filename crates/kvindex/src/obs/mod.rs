//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! Index and query code never touches `metrics` state directly; every
//! counter flows through `sink::record`.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventReport, NamespaceCounters};
pub use sink::{MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink};
