//! Prometheus metrics for token issuance and validation.
//!
//! Labels never carry subjects, keys or token contents.

#![allow(clippy::expect_used)]

use once_cell::sync::Lazy;
use prometheus::{CounterVec, HistogramVec, register_counter_vec, register_histogram_vec};

/// Outcome label for a successful validation.
pub const OUTCOME_VALID: &str = "valid";

/// Tokens issued counter.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_core_tokens_issued_total",
        "Total number of tokens issued",
        &["format", "purpose"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Issuance failures counter.
pub static ISSUE_FAILURES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_core_issue_failures_total",
        "Total number of failed issuance attempts",
        &["purpose", "reason"]
    )
    .expect("Failed to register issue_failures metric")
});

/// Validations counter, labelled with `valid` or the failure reason code.
pub static TOKEN_VALIDATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_core_validations_total",
        "Total number of token validations",
        &["format", "outcome"]
    )
    .expect("Failed to register validations metric")
});

/// Issue/validate latency histogram.
pub static OPERATION_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "token_core_operation_latency_seconds",
        "Token operation latency in seconds",
        &["operation", "format"],
        vec![0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1]
    )
    .expect("Failed to register operation_latency metric")
});

/// Record a token issuance.
pub fn record_token_issued(format: &str, purpose: &str) {
    TOKENS_ISSUED.with_label_values(&[format, purpose]).inc();
}

/// Record a failed issuance.
pub fn record_issue_failure(purpose: &str, reason: &str) {
    ISSUE_FAILURES.with_label_values(&[purpose, reason]).inc();
}

/// Record a validation outcome.
pub fn record_validation(format: &str, outcome: &str) {
    TOKEN_VALIDATIONS.with_label_values(&[format, outcome]).inc();
}

/// Record operation latency.
pub fn record_latency(operation: &str, format: &str, duration_secs: f64) {
    OPERATION_LATENCY
        .with_label_values(&[operation, format])
        .observe(duration_secs);
}
