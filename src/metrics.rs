// src/metrics.rs

#[cfg(feature = "observability")]
pub use metrics::{counter, describe_counter, describe_histogram, histogram};

// NOTE: When observability feature is disabled, provide stub implementations
#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! counter {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
    ($name:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! histogram {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_counter {
    ($name:expr, $unit:expr, $desc:expr) => {};
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_histogram {
    ($name:expr, $unit:expr, $desc:expr) => {};
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
use crate::{counter, describe_counter, describe_histogram, histogram};

/// Initializes the descriptions for all the metrics in the SDK.
/// This should be called once at startup.
pub fn describe_metrics() {
    describe_counter!("route_queries_total", "Route queries issued, by kind.");
    describe_counter!("cache_hits_total", "Adapter cache hits.");
    describe_counter!("cache_miss_total", "Adapter cache misses.");
    describe_counter!("payloads_encoded_total", "Swap payloads encoded, by strategy.");
    describe_counter!(
        "pool_curves_fitted_total",
        "Pool liquidity curves fitted, by outcome."
    );
    describe_histogram!(
        "multicall_batch_size_bucket",
        "Number of calls per multicall aggregate."
    );
}

pub fn increment_route_query(kind: &str) {
    counter!("route_queries_total", 1, "kind" => kind.to_string());
}

pub fn increment_cache_hit(cache_name: &str) {
    counter!("cache_hits_total", 1, "cache" => cache_name.to_string());
}

pub fn increment_cache_miss(cache_name: &str) {
    counter!("cache_miss_total", 1, "cache" => cache_name.to_string());
}

pub fn increment_payload_encoded(strategy: &str) {
    counter!("payloads_encoded_total", 1, "strategy" => strategy.to_string());
}

pub fn increment_curve_fit(outcome: &str) {
    counter!("pool_curves_fitted_total", 1, "outcome" => outcome.to_string());
}

pub fn record_multicall_batch_size(size: f64) {
    histogram!("multicall_batch_size_bucket", size);
}

/// Serves `/metrics` for Prometheus on `addr`. Needs a running tokio runtime.
#[cfg(feature = "observability")]
pub fn install_prometheus_exporter(addr: std::net::SocketAddr) -> anyhow::Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;
    describe_metrics();
    Ok(())
}
