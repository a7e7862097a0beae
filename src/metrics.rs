//! Prometheus metrics for the dashboard.
//!
//! Exposes:
//! - `news_dashboard_render_duration_seconds` (histogram)
//! - `news_dashboard_render_total` (counter with status)
//! - `news_dashboard_dataset_loads_total` (counter by cache outcome)
//! - `news_dashboard_cache_invalidations_total` (counter)
//! - process metrics via `process` collector

use std::time::Duration;

use once_cell::sync::Lazy;
use prometheus::process_collector::ProcessCollector;
use prometheus::{
    default_registry, register_histogram_vec, register_int_counter, register_int_counter_vec,
    Encoder, HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};
use tracing::{error, warn};

static PROCESS_COLLECTOR: Lazy<()> = Lazy::new(|| {
    if let Err(err) = default_registry().register(Box::new(ProcessCollector::for_self())) {
        warn!("Failed to register process collector: {}", err);
    }
});

static RENDER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    // Exponential buckets from 1ms up to ~16 seconds.
    let buckets =
        prometheus::exponential_buckets(0.001, 2.0, 15).expect("failed to create histogram buckets");
    register_histogram_vec!(
        "news_dashboard_render_duration_seconds",
        "Dashboard render duration in seconds",
        &["view"],
        buckets
    )
    .expect("failed to register render duration histogram")
});

static RENDER_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "news_dashboard_render_total",
        "Total dashboard renders by status",
        &["view", "status"]
    )
    .expect("failed to register render counter")
});

static DATASET_LOADS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "news_dashboard_dataset_loads_total",
        "Dataset lookups by cache outcome",
        &["outcome"]
    )
    .expect("failed to register dataset load counter")
});

static CACHE_INVALIDATIONS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "news_dashboard_cache_invalidations_total",
        "Explicit cache invalidations (refresh button)"
    )
    .expect("failed to register cache invalidation counter")
});

/// Ensure collectors are registered.
fn init_collectors() {
    Lazy::force(&PROCESS_COLLECTOR);
    Lazy::force(&RENDER_DURATION);
    Lazy::force(&RENDER_TOTAL);
    Lazy::force(&DATASET_LOADS);
    Lazy::force(&CACHE_INVALIDATIONS);
}

/// Record a finished render with duration and status.
pub fn record_render(view: &'static str, duration: Duration, success: bool) {
    init_collectors();
    RENDER_DURATION
        .with_label_values(&[view])
        .observe(duration.as_secs_f64());
    RENDER_TOTAL
        .with_label_values(&[view, if success { "ok" } else { "error" }])
        .inc();
}

/// Record a dataset lookup: `hit`, `miss` or `error`.
pub fn record_dataset_load(outcome: &'static str) {
    init_collectors();
    DATASET_LOADS.with_label_values(&[outcome]).inc();
}

pub fn record_cache_invalidation() {
    init_collectors();
    CACHE_INVALIDATIONS.inc();
}

/// Encode all registered metrics in the Prometheus text format.
///
/// Returns the content type and the encoded body.
pub fn encode_metrics() -> Result<(String, Vec<u8>), prometheus::Error> {
    init_collectors();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer).map_err(|err| {
        error!("Failed to encode metrics: {}", err);
        err
    })?;

    Ok((encoder.format_type().to_string(), buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_successful_render_metrics() {
        let view = "test_render_success";

        record_render(view, Duration::from_millis(12), true);

        assert_eq!(RENDER_TOTAL.with_label_values(&[view, "ok"]).get(), 1);
        assert_eq!(
            RENDER_DURATION.with_label_values(&[view]).get_sample_count(),
            1
        );
    }

    #[test]
    fn records_failed_render_metrics() {
        let view = "test_render_error";

        record_render(view, Duration::from_secs(2), false);

        assert_eq!(RENDER_TOTAL.with_label_values(&[view, "error"]).get(), 1);
        assert_eq!(RENDER_TOTAL.with_label_values(&[view, "ok"]).get(), 0);
        let sum = RENDER_DURATION.with_label_values(&[view]).get_sample_sum();
        assert!(sum >= 2.0);
    }

    #[test]
    fn dataset_load_outcomes_tracked_separately() {
        let before_hit = DATASET_LOADS.with_label_values(&["hit"]).get();
        let before_miss = DATASET_LOADS.with_label_values(&["miss"]).get();

        record_dataset_load("hit");
        record_dataset_load("hit");
        record_dataset_load("miss");

        assert!(DATASET_LOADS.with_label_values(&["hit"]).get() >= before_hit + 2);
        assert!(DATASET_LOADS.with_label_values(&["miss"]).get() > before_miss);
    }

    #[test]
    fn invalidations_are_counted() {
        let before = CACHE_INVALIDATIONS.get();
        record_cache_invalidation();
        assert!(CACHE_INVALIDATIONS.get() > before);
    }

    #[test]
    fn encoded_metrics_contain_registered_families() {
        record_render("test_encode_view", Duration::from_millis(1), true);

        let (content_type, body) = encode_metrics().expect("encode metrics");
        let text = String::from_utf8(body).expect("utf-8 metrics body");

        assert!(content_type.starts_with("text/plain"));
        assert!(text.contains("news_dashboard_render_total"));
        assert!(text.contains("test_encode_view"));
    }

    #[test]
    fn init_collectors_can_be_called_multiple_times() {
        init_collectors();
        init_collectors();
        init_collectors();
    }
}
