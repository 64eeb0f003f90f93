//! Observability: structured logging and Prometheus metrics.

mod logging;
mod metrics;

pub use self::logging::{LogFormat, LoggingConfig, init_tracing};
pub use self::metrics::{
    MetricsConfig, MetricsError, init_metrics, record_candidate, record_run, record_test_metric,
    record_window,
};
