//! Prometheus-compatible metrics for the Trellis service.
//!
//! This module provides observability metrics for monitoring
//! classification traffic, cache behavior, and oracle calls using the
//! prometheus crate.

use prometheus::{self, Histogram, HistogramOpts, IntCounter, IntGauge, Registry};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// Global metrics instance.
static METRICS: std::sync::OnceLock<Arc<Metrics>> = std::sync::OnceLock::new();

/// Get or initialize the global metrics instance.
pub fn get_metrics() -> Arc<Metrics> {
    METRICS.get_or_init(|| Arc::new(Metrics::new())).clone()
}

/// Default histogram buckets for latency tracking (in seconds).
/// Covers from 1ms to 10s with reasonable granularity.
fn default_latency_buckets() -> Vec<f64> {
    vec![
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ]
}

/// Buckets for oracle round trips, which upload files and wait on a
/// generative model. Reaches 60s to match the request timeout range.
fn oracle_latency_buckets() -> Vec<f64> {
    vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0]
}

/// All metrics for the Trellis service.
pub struct Metrics {
    /// Prometheus registry for all metrics.
    pub registry: Registry,

    // =========================================================================
    // Counters
    // =========================================================================
    /// Total number of classification requests completed.
    pub classifications_total: IntCounter,
    /// Total number of classification requests that failed.
    pub classification_errors_total: IntCounter,
    /// Total number of uploads rejected before reaching the oracle.
    pub uploads_rejected_total: IntCounter,
    /// Total number of cache hits.
    pub cache_hits_total: IntCounter,
    /// Total number of cache misses.
    pub cache_misses_total: IntCounter,
    /// Total number of oracle API calls made.
    pub oracle_requests_total: IntCounter,
    /// Total number of failed oracle API calls.
    pub oracle_errors_total: IntCounter,

    // =========================================================================
    // Gauges
    // =========================================================================
    /// Number of entities in the loaded taxonomy snapshot.
    pub taxonomy_entities: IntGauge,
    /// Number of entries currently in the classification cache.
    pub cache_entries: IntGauge,
    /// Uptime in seconds.
    pub uptime_seconds: IntGauge,

    // =========================================================================
    // Histograms (durations in seconds)
    // =========================================================================
    /// End-to-end classification duration in seconds.
    pub classification_duration_seconds: Histogram,
    /// Single oracle round trip duration in seconds.
    pub oracle_request_duration_seconds: Histogram,

    /// Server start time.
    start_time: RwLock<Instant>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics instance with all metrics registered.
    pub fn new() -> Self {
        let registry = Registry::new();

        // Counters
        let classifications_total = IntCounter::new(
            "trellis_classifications_total",
            "Total number of classification requests completed",
        )
        .expect("failed to create counter");

        let classification_errors_total = IntCounter::new(
            "trellis_classification_errors_total",
            "Total number of classification requests that failed",
        )
        .expect("failed to create counter");

        let uploads_rejected_total = IntCounter::new(
            "trellis_uploads_rejected_total",
            "Total number of uploads rejected before reaching the oracle",
        )
        .expect("failed to create counter");

        let cache_hits_total =
            IntCounter::new("trellis_cache_hits_total", "Total number of cache hits")
                .expect("failed to create counter");

        let cache_misses_total =
            IntCounter::new("trellis_cache_misses_total", "Total number of cache misses")
                .expect("failed to create counter");

        let oracle_requests_total = IntCounter::new(
            "trellis_oracle_requests_total",
            "Total number of oracle API calls made",
        )
        .expect("failed to create counter");

        let oracle_errors_total = IntCounter::new(
            "trellis_oracle_errors_total",
            "Total number of failed oracle API calls",
        )
        .expect("failed to create counter");

        // Gauges
        let taxonomy_entities = IntGauge::new(
            "trellis_taxonomy_entities",
            "Number of entities in the loaded taxonomy snapshot",
        )
        .expect("failed to create gauge");

        let cache_entries = IntGauge::new(
            "trellis_cache_entries",
            "Number of entries currently in the classification cache",
        )
        .expect("failed to create gauge");

        let uptime_seconds = IntGauge::new("trellis_uptime_seconds", "Server uptime in seconds")
            .expect("failed to create gauge");

        // Histograms with latency buckets (in seconds)
        let classification_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "trellis_classification_duration_seconds",
                "End-to-end classification duration in seconds",
            )
            .buckets(default_latency_buckets()),
        )
        .expect("failed to create histogram");

        let oracle_request_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "trellis_oracle_request_duration_seconds",
                "Single oracle round trip duration in seconds",
            )
            .buckets(oracle_latency_buckets()),
        )
        .expect("failed to create histogram");

        // Register all metrics
        registry
            .register(Box::new(classifications_total.clone()))
            .expect("failed to register metric");
        registry
            .register(Box::new(classification_errors_total.clone()))
            .expect("failed to register metric");
        registry
            .register(Box::new(uploads_rejected_total.clone()))
            .expect("failed to register metric");
        registry
            .register(Box::new(cache_hits_total.clone()))
            .expect("failed to register metric");
        registry
            .register(Box::new(cache_misses_total.clone()))
            .expect("failed to register metric");
        registry
            .register(Box::new(oracle_requests_total.clone()))
            .expect("failed to register metric");
        registry
            .register(Box::new(oracle_errors_total.clone()))
            .expect("failed to register metric");
        registry
            .register(Box::new(taxonomy_entities.clone()))
            .expect("failed to register metric");
        registry
            .register(Box::new(cache_entries.clone()))
            .expect("failed to register metric");
        registry
            .register(Box::new(uptime_seconds.clone()))
            .expect("failed to register metric");
        registry
            .register(Box::new(classification_duration_seconds.clone()))
            .expect("failed to register metric");
        registry
            .register(Box::new(oracle_request_duration_seconds.clone()))
            .expect("failed to register metric");

        Self {
            registry,
            // Counters
            classifications_total,
            classification_errors_total,
            uploads_rejected_total,
            cache_hits_total,
            cache_misses_total,
            oracle_requests_total,
            oracle_errors_total,
            // Gauges
            taxonomy_entities,
            cache_entries,
            uptime_seconds,
            // Histograms
            classification_duration_seconds,
            oracle_request_duration_seconds,
            // Internal state
            start_time: RwLock::new(Instant::now()),
        }
    }

    /// Update the uptime gauge.
    pub fn update_uptime(&self) {
        let uptime = self.start_time.read().elapsed();
        self.uptime_seconds.set(uptime.as_secs() as i64);
    }

    /// Export metrics in Prometheus text format.
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;
        self.update_uptime();

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    /// Start a timer that records duration to a histogram when dropped.
    /// Returns a guard that will observe the duration in seconds.
    pub fn start_timer(histogram: &Histogram) -> HistogramTimer {
        HistogramTimer {
            histogram: histogram.clone(),
            start: Instant::now(),
        }
    }
}

/// Timer that records duration to a histogram when dropped.
pub struct HistogramTimer {
    histogram: Histogram,
    start: Instant,
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.histogram.observe(duration.as_secs_f64());
    }
}

impl HistogramTimer {
    /// Get the elapsed time without stopping the timer.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the elapsed duration.
    /// The duration is recorded in the histogram on drop.
    pub fn stop(self) -> Duration {
        self.start.elapsed()
    }
}
