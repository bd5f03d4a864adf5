//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("fub_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");
    pub static ref HTTP_REQUEST_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "fub_http_request_duration_seconds",
            "HTTP request duration in seconds"
        ).buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        &["method", "endpoint"]
    ).expect("metric can be created");

    // Discovery Metrics
    pub static ref WEBFINGER_LOOKUPS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("fub_webfinger_lookups_total", "Total number of WebFinger lookups"),
        &["outcome"]
    ).expect("metric can be created");
    pub static ref WEBFINGER_DOMAIN_MISMATCH_TOTAL: IntCounter = IntCounter::new(
        "fub_webfinger_domain_mismatch_total",
        "WebFinger queries naming a domain this server does not serve"
    ).expect("metric can be created");

    // Key Material Metrics
    pub static ref KEYS_GENERATED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("fub_keys_generated_total", "Total number of keypair generations"),
        &["status"]
    ).expect("metric can be created");

    // Application Metrics
    pub static ref USERS_TOTAL: IntGauge = IntGauge::new(
        "fub_users_total",
        "Number of accounts in the user directory"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("fub_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
///
/// Call once at startup; registering twice fails.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("HTTP_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("HTTP_REQUEST_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(WEBFINGER_LOOKUPS_TOTAL.clone()))
        .expect("WEBFINGER_LOOKUPS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(WEBFINGER_DOMAIN_MISMATCH_TOTAL.clone()))
        .expect("WEBFINGER_DOMAIN_MISMATCH_TOTAL can be registered");
    REGISTRY
        .register(Box::new(KEYS_GENERATED_TOTAL.clone()))
        .expect("KEYS_GENERATED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(USERS_TOTAL.clone()))
        .expect("USERS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}

/// Record a finished HTTP request.
pub fn observe_request(method: &str, endpoint: &str, status: u16) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, &status.to_string()])
        .inc();
}
