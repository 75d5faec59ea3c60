//! Metrics collection for Massive Stub
//!
//! Prometheus counters for store traffic and listener delivery, registered
//! on a crate-private registry so embedding applications are unaffected.

use crate::core::error::Result;
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Histogram, IntCounter,
    IntCounterVec, IntGauge, Registry,
};
use std::time::Instant;

/// Global metrics registry
static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Store operation counters
pub struct StoreMetrics {
    /// One-shot reads served, labelled by event type
    pub reads: IntCounterVec,
    /// Mutations applied, labelled by operation (set, update, remove, push)
    pub mutations: IntCounterVec,
    /// Number of times the tree was re-seeded
    pub initializations: IntCounter,
    /// Histogram of mutation durations in seconds, including notify
    pub mutation_duration: Histogram,
}

/// Listener registry and dispatcher metrics
pub struct ListenerMetrics {
    /// Currently registered subscriptions
    pub active_subscriptions: IntGauge,
    /// Events handed to callbacks
    pub events_delivered: IntCounter,
    /// Events skipped because the subscription was cancelled first
    pub events_dropped: IntCounter,
    /// Callbacks that panicked during delivery
    pub listener_panics: IntCounter,
    /// Dispatcher workers started, one per runtime that scheduled deliveries
    pub dispatcher_starts: IntCounter,
}

/// Centralized metrics collection
pub struct Metrics {
    /// Store metrics
    pub store: StoreMetrics,
    /// Listener metrics
    pub listeners: ListenerMetrics,
}

impl Metrics {
    /// Create new metrics instance registered on `registry`
    pub fn new(registry: &Registry) -> Result<Self> {
        Ok(Self {
            store: StoreMetrics::new(registry)?,
            listeners: ListenerMetrics::new(registry)?,
        })
    }

    /// Get the global metrics instance
    pub fn global() -> &'static Metrics {
        static INSTANCE: Lazy<Metrics> = Lazy::new(|| {
            Metrics::new(&REGISTRY).expect("Failed to initialize metrics")
        });
        &INSTANCE
    }
}

impl StoreMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        Ok(Self {
            reads: register_int_counter_vec_with_registry!(
                "ms_reads_total",
                "Total number of one-shot reads",
                &["event"],
                registry
            )?,
            mutations: register_int_counter_vec_with_registry!(
                "ms_mutations_total",
                "Total number of mutations applied",
                &["op"],
                registry
            )?,
            initializations: register_int_counter_with_registry!(
                "ms_initializations_total",
                "Total number of store initializations",
                registry
            )?,
            mutation_duration: register_histogram_with_registry!(
                "ms_mutation_duration_seconds",
                "Duration of mutations including listener recompute",
                vec![0.00001, 0.0001, 0.001, 0.01, 0.1, 1.0],
                registry
            )?,
        })
    }
}

impl ListenerMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        Ok(Self {
            active_subscriptions: register_int_gauge_with_registry!(
                "ms_active_subscriptions",
                "Number of registered subscriptions",
                registry
            )?,
            events_delivered: register_int_counter_with_registry!(
                "ms_events_delivered_total",
                "Total events handed to listener callbacks",
                registry
            )?,
            events_dropped: register_int_counter_with_registry!(
                "ms_events_dropped_total",
                "Total events skipped for cancelled subscriptions",
                registry
            )?,
            listener_panics: register_int_counter_with_registry!(
                "ms_listener_panics_total",
                "Total listener callbacks that panicked",
                registry
            )?,
            dispatcher_starts: register_int_counter_with_registry!(
                "ms_dispatcher_starts_total",
                "Total dispatcher workers started",
                registry
            )?,
        })
    }
}

/// Timer for measuring operation duration with automatic histogram recording
pub struct Timer {
    start: Instant,
    histogram: Histogram,
}

impl Timer {
    /// Start a new timer
    pub fn start(histogram: Histogram) -> Self {
        Self {
            start: Instant::now(),
            histogram,
        }
    }

    /// Record the elapsed time and consume the timer
    pub fn finish(self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Time a block and record its duration on a histogram
#[macro_export]
macro_rules! time_operation {
    ($metric:expr, $body:expr) => {{
        let timer = $crate::system::metrics::Timer::start($metric.clone());
        let result = $body;
        timer.finish();
        result
    }};
}

/// Initialize the metrics registry by creating the global metrics instance
pub fn init_registry() {
    let _ = Metrics::global();
}

/// The registry holding every emulator metric
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Collect and return all metrics as a Prometheus-formatted string
pub fn collect_metrics() -> String {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = registry().gather();
    encoder.encode_to_string(&metric_families).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_metrics_render() {
        init_registry();
        Metrics::global().store.initializations.inc();
        let text = collect_metrics();
        assert!(text.contains("ms_initializations_total"));
    }

    #[test]
    fn timer_records_an_observation() {
        let histogram = Metrics::global().store.mutation_duration.clone();
        let before = histogram.get_sample_count();
        let value = time_operation!(histogram, { 2 + 2 });
        assert_eq!(value, 4);
        assert!(histogram.get_sample_count() > before);
    }
}
