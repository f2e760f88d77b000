//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Discovery (health probes, discovery cycles, registered providers)
//! - Conversions (results, duration)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts};

// =============================================================================
// Discovery Metrics
// =============================================================================

/// Health probe attempts by service and result.
pub static HEALTH_PROBE_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "renditions_health_probe_attempts_total",
            "Total health probe attempts against transform services",
        ),
        &["service", "result"], // "up", "down", "error"
    )
    .unwrap()
});

/// Discovery cycles by service and result.
pub static DISCOVERY_CYCLES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "renditions_discovery_cycles_total",
            "Total discovery cycles",
        ),
        &["service", "result"], // "success", "unhealthy", "config_fetch", "registry"
    )
    .unwrap()
});

/// Providers currently registered, per service.
pub static PROVIDERS_REGISTERED: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "renditions_providers_registered",
            "Rendition providers currently registered",
        ),
        &["service"],
    )
    .unwrap()
});

// =============================================================================
// Conversion Metrics
// =============================================================================

/// Conversions by service and outcome.
pub static CONVERSIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("renditions_conversions_total", "Total conversions"),
        &["service", "result"],
    )
    .unwrap()
});

/// Conversion round-trip duration in seconds (until response headers).
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "renditions_conversion_duration_seconds",
            "Duration of conversion requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["service"],
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(HEALTH_PROBE_ATTEMPTS.clone()),
        Box::new(DISCOVERY_CYCLES.clone()),
        Box::new(PROVIDERS_REGISTERED.clone()),
        Box::new(CONVERSIONS.clone()),
        Box::new(CONVERSION_DURATION.clone()),
    ]
}
