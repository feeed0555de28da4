/// Prometheus metrics for the monitoring engine
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec_with_registry, register_gauge_with_registry,
    register_histogram_with_registry, CounterVec, Encoder, Gauge, Histogram, Registry,
    TextEncoder,
};

lazy_static! {
    /// Registry for all engine metrics
    pub static ref REGISTRY: Registry = Registry::new();

    // ======================
    // Counters
    // ======================

    /// Total engagement events ingested (labels: status)
    /// status: accepted, duplicate, rejected
    pub static ref EVENTS_INGESTED: CounterVec = register_counter_vec_with_registry!(
        "engagement_events_ingested_total",
        "Total number of engagement events submitted for ingestion",
        &["status"],
        REGISTRY
    )
    .expect("Failed to register metric");

    /// Total alerts emitted (labels: type)
    pub static ref ALERTS_EMITTED: CounterVec = register_counter_vec_with_registry!(
        "analytics_alerts_emitted_total",
        "Total number of alerts raised by the rule engine",
        &["type"],
        REGISTRY
    )
    .expect("Failed to register metric");

    /// Per-item evaluation outcomes (labels: status)
    /// status: ok, timeout
    pub static ref EVALUATIONS: CounterVec = register_counter_vec_with_registry!(
        "analytics_evaluations_total",
        "Total number of per-item evaluation attempts on the scheduler tick",
        &["status"],
        REGISTRY
    )
    .expect("Failed to register metric");

    // ======================
    // Histograms
    // ======================

    /// Wall-clock duration of one full evaluation tick
    pub static ref EVALUATION_TICK_SECONDS: Histogram = register_histogram_with_registry!(
        "analytics_evaluation_tick_seconds",
        "Duration of a full evaluation pass over all subscribed content",
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5],
        REGISTRY
    )
    .expect("Failed to register metric");

    // ======================
    // Gauges
    // ======================

    /// Content items currently held in memory
    pub static ref TRACKED_CONTENT: Gauge = register_gauge_with_registry!(
        "analytics_tracked_content",
        "Number of content items with in-memory aggregation state",
        REGISTRY
    )
    .expect("Failed to register metric");

    /// Content items with at least one active subscription
    pub static ref LIVE_CONTENT: Gauge = register_gauge_with_registry!(
        "analytics_live_content",
        "Number of content items scheduled for periodic evaluation",
        REGISTRY
    )
    .expect("Failed to register metric");

    /// Entries currently held by the event dedup cache
    pub static ref DEDUP_ENTRIES: Gauge = register_gauge_with_registry!(
        "analytics_dedup_entries",
        "Number of event ids tracked by the deduplication cache",
        REGISTRY
    )
    .expect("Failed to register metric");
}

/// Render all registered metrics in Prometheus text exposition format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }

    String::from_utf8(buffer).unwrap_or_default()
}
