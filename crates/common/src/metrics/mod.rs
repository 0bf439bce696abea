//! Metrics and observability utilities
//!
//! Provides fetch, cooldown and generation metrics with
//! standardized naming conventions.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Citree metrics
pub const METRICS_PREFIX: &str = "citree";

/// Buckets for remote lookup latency (in seconds)
pub const FETCH_BUCKETS: &[f64] = &[
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
    120.0,  // 2min
    350.0,  // request timeout
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Fetch metrics
    describe_counter!(
        format!("{}_fetches_total", METRICS_PREFIX),
        Unit::Count,
        "Total remote record lookups"
    );

    describe_counter!(
        format!("{}_fetch_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Lookups that degraded to an all-unknown record"
    );

    describe_histogram!(
        format!("{}_fetch_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Remote lookup latency in seconds"
    );

    // Rate limit metrics
    describe_counter!(
        format!("{}_cooldowns_total", METRICS_PREFIX),
        Unit::Count,
        "Full-window pauses, from an exhausted budget or upstream throttling"
    );

    // Generation metrics
    describe_gauge!(
        format!("{}_papers_total", METRICS_PREFIX),
        Unit::Count,
        "Papers in the paper graph"
    );

    describe_gauge!(
        format!("{}_authors_total", METRICS_PREFIX),
        Unit::Count,
        "Authors in the co-authorship graph"
    );

    describe_gauge!(
        format!("{}_retry_total", METRICS_PREFIX),
        Unit::Count,
        "Identifiers waiting for reprocessing"
    );

    describe_gauge!(
        format!("{}_generation", METRICS_PREFIX),
        Unit::Count,
        "Last completed generation"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record a single lookup
pub struct FetchMetrics {
    start: Instant,
}

impl FetchMetrics {
    /// Start tracking a lookup
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Record lookup completion
    pub fn finish(self, success: bool) {
        let duration = self.start.elapsed().as_secs_f64();
        let status = if success { "success" } else { "error" };

        counter!(
            format!("{}_fetches_total", METRICS_PREFIX),
            "status" => status
        )
        .increment(1);

        if success {
            histogram!(format!("{}_fetch_duration_seconds", METRICS_PREFIX)).record(duration);
        } else {
            counter!(format!("{}_fetch_failures_total", METRICS_PREFIX)).increment(1);
        }
    }
}

/// Helper to record a rate limit cooldown
pub fn record_cooldown(window_secs: u64) {
    counter!(
        format!("{}_cooldowns_total", METRICS_PREFIX),
        "window_secs" => window_secs.to_string()
    )
    .increment(1);
}

/// Helper to record generation completion
pub fn record_generation(generation: u32, papers: usize, authors: usize, retry: usize) {
    gauge!(format!("{}_generation", METRICS_PREFIX)).set(generation as f64);
    gauge!(format!("{}_papers_total", METRICS_PREFIX)).set(papers as f64);
    gauge!(format!("{}_authors_total", METRICS_PREFIX)).set(authors as f64);
    gauge!(format!("{}_retry_total", METRICS_PREFIX)).set(retry as f64);
}
