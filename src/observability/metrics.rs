//! # Metrics
//!
//! Prometheus metrics for monitoring the operator.
//!
//! ## Metrics Exposed
//!
//! - `bunny_cdn_reconciliations_total{kind}` - Reconciliations that ran (idempotent skips excluded)
//! - `bunny_cdn_reconciliation_errors_total{kind}` - Reconciliations that ended in a failure status
//! - `bunny_cdn_reconciliation_duration_seconds{kind}` - Duration of reconciliations
//! - `bunny_cdn_event_failures_total{kind}` - Events whose handling failed at the dispatcher boundary
//! - `bunny_cdn_dependency_retries_total{kind}` - Waits for a referenced resource to become ready
//! - `bunny_cdn_provider_operations_total{operation}` - Bunny CDN API calls
//! - `bunny_cdn_provider_operation_errors_total{operation}` - Failed Bunny CDN API calls
//! - `bunny_cdn_secrets_materialized_total` - Credential secrets (re)created

use anyhow::Result;
use prometheus::{HistogramVec, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "bunny_cdn_reconciliations_total",
            "Total number of reconciliations by resource kind",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "bunny_cdn_reconciliation_errors_total",
            "Total number of reconciliations that ended with a failure status",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "bunny_cdn_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static EVENT_FAILURES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "bunny_cdn_event_failures_total",
            "Total number of watch events whose handling failed",
        ),
        &["kind"],
    )
    .expect("Failed to create EVENT_FAILURES_TOTAL metric - this should never happen")
});

static DEPENDENCY_RETRIES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "bunny_cdn_dependency_retries_total",
            "Total number of retries while waiting for a referenced resource",
        ),
        &["kind"],
    )
    .expect("Failed to create DEPENDENCY_RETRIES_TOTAL metric - this should never happen")
});

static PROVIDER_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "bunny_cdn_provider_operations_total",
            "Total number of Bunny CDN API operations",
        ),
        &["operation"],
    )
    .expect("Failed to create PROVIDER_OPERATIONS_TOTAL metric - this should never happen")
});

static PROVIDER_OPERATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "bunny_cdn_provider_operation_errors_total",
            "Total number of failed Bunny CDN API operations",
        ),
        &["operation"],
    )
    .expect("Failed to create PROVIDER_OPERATION_ERRORS_TOTAL metric - this should never happen")
});

static SECRETS_MATERIALIZED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "bunny_cdn_secrets_materialized_total",
        "Total number of credential secrets created",
    )
    .expect("Failed to create SECRETS_MATERIALIZED_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Only fails when a metric is registered twice"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(EVENT_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DEPENDENCY_RETRIES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PROVIDER_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PROVIDER_OPERATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SECRETS_MATERIALIZED_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations(kind: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_reconciliation_errors(kind: &str) {
    RECONCILIATION_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn observe_reconciliation_duration(kind: &str, duration: f64) {
    RECONCILIATION_DURATION
        .with_label_values(&[kind])
        .observe(duration);
}

pub fn increment_event_failures(kind: &str) {
    EVENT_FAILURES_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_dependency_retries(kind: &str) {
    DEPENDENCY_RETRIES_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_provider_operations(operation: &str) {
    PROVIDER_OPERATIONS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

pub fn increment_provider_operation_errors(operation: &str) {
    PROVIDER_OPERATION_ERRORS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

pub fn increment_secrets_materialized() {
    SECRETS_MATERIALIZED_TOTAL.inc();
}
