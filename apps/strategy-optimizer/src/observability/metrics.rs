//! Prometheus metrics for optimization runs.
//!
//! Recording is always safe: without an installed exporter the `metrics`
//! facade discards every sample.

use std::net::{Ipv4Addr, SocketAddr};

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::Phase;

/// Configuration for the metrics exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Whether to start the exporter.
    pub enabled: bool,
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
    /// Histogram buckets for evaluation latency (in seconds).
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 9090)),
            // 100us to 10s
            latency_buckets: vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0,
            ],
        }
    }
}

/// Initialize the Prometheus metrics exporter.
///
/// This starts an HTTP server that exposes metrics at `/metrics`.
///
/// # Errors
///
/// Returns an error if the exporter fails to start (e.g., port already in use).
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .set_buckets(&config.latency_buckets)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(
        addr = %config.listen_addr,
        "Prometheus metrics exporter started"
    );

    Ok(())
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure metrics exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

/// Record one candidate evaluation.
///
/// # Arguments
///
/// * `phase` - Optimizer phase the evaluation belongs to
/// * `outcome` - "ok", "failed" or "skipped"
/// * `seconds` - Wall time of the evaluation
pub fn record_candidate(phase: Phase, outcome: &'static str, seconds: f64) {
    counter!(
        "optimizer_candidates_total",
        "phase" => phase.as_str(),
        "outcome" => outcome
    )
    .increment(1);

    if outcome != "skipped" {
        histogram!(
            "optimizer_candidate_eval_seconds",
            "phase" => phase.as_str()
        )
        .record(seconds);
    }
}

/// Record a finished optimization run.
///
/// `outcome` is "success" or an error kind such as "no_viable_candidate".
pub fn record_run(mode: &'static str, outcome: &'static str) {
    counter!(
        "optimizer_runs_total",
        "mode" => mode,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record one rolling window outcome.
pub fn record_window(outcome: &'static str) {
    counter!("optimizer_windows_total", "outcome" => outcome).increment(1);
}

/// Publish the test metric of the latest successful run.
pub fn record_test_metric(metric: &str, value: Decimal) {
    if let Some(v) = value.to_f64() {
        gauge!("optimizer_test_metric", "metric" => metric.to_string()).set(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_disabled() {
        let config = MetricsConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.listen_addr.port(), 9090);
    }

    #[test]
    fn test_recording_without_exporter_is_noop() {
        record_candidate(Phase::Search, "ok", 0.01);
        record_candidate(Phase::Select, "skipped", 0.0);
        record_run("walk_forward", "success");
        record_window("failed");
        record_test_metric("sharpe_ratio", Decimal::ONE);
    }
}
