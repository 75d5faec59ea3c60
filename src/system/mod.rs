//! System utilities and monitoring

/// Prometheus metrics
pub mod metrics;

pub use metrics::{collect_metrics, Metrics};
