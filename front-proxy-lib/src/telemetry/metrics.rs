use opentelemetry::global;
use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter, UpDownCounter};
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;
use std::sync::Arc;

use crate::error::{ProxyError, Result};

pub mod labels {
    pub const ERROR_TYPE: &str = "error_type";
    pub const OUTCOME: &str = "outcome";
    pub const PROTOCOL: &str = "protocol";
    pub const STATUS_CODE: &str = "status_code";
    pub const METHOD: &str = "method";
    pub const BACKEND_ADDRESS: &str = "backend_address";
    pub const VERSION: &str = "version";
}

pub mod values {
    pub const OUTCOME_ADMITTED: &str = "admitted";
    pub const OUTCOME_RATE_LIMITED: &str = "rate_limited";
    pub const OUTCOME_UNRESOLVED_REJECTED: &str = "unresolved_rejected";
    pub const OUTCOME_UNRESOLVED_ALLOWED: &str = "unresolved_allowed";
    pub const OUTCOME_BYPASSED: &str = "bypassed";
}

#[derive(Clone)]
pub struct Metrics {
    pub connections_total: Counter<u64>,
    pub connections_active: UpDownCounter<i64>,

    pub requests_total: Counter<u64>,
    pub requests_duration_seconds: Histogram<f64>,

    pub backend_errors_total: Counter<u64>,

    // Admission control
    pub admission_decisions_total: Counter<u64>,
    pub rate_limit_evictions_total: Counter<u64>,
    pub rate_limit_identities: Gauge<u64>,

    pub build_info: Gauge<u64>,
}

impl Metrics {
    pub fn new(meter: Meter) -> Self {
        Self {
            connections_total: meter
                .u64_counter("front_proxy_connections_total")
                .with_description("Total number of connections accepted")
                .build(),
            connections_active: meter
                .i64_up_down_counter("front_proxy_connections_active")
                .with_description("Number of active connections")
                .build(),

            requests_total: meter
                .u64_counter("front_proxy_requests_total")
                .with_description("Total number of requests processed")
                .build(),
            requests_duration_seconds: meter
                .f64_histogram("front_proxy_requests_duration_seconds")
                .with_description("Request duration in seconds")
                .build(),

            backend_errors_total: meter
                .u64_counter("front_proxy_backend_errors_total")
                .with_description("Total number of failed backend requests")
                .build(),

            admission_decisions_total: meter
                .u64_counter("front_proxy_admission_decisions_total")
                .with_description("Admission control decisions by outcome")
                .build(),
            rate_limit_evictions_total: meter
                .u64_counter("front_proxy_rate_limit_evictions_total")
                .with_description("Idle identities evicted from the rate limit registry")
                .build(),
            rate_limit_identities: meter
                .u64_gauge("front_proxy_rate_limit_identities")
                .with_description("Identities currently tracked by the rate limit registry")
                .build(),

            build_info: meter
                .u64_gauge("front_proxy_build_info")
                .with_description("Build information")
                .build(),
        }
    }

    pub fn set_build_info(&self) {
        self.build_info
            .record(1, &[KeyValue::new(labels::VERSION, env!("CARGO_PKG_VERSION"))]);
    }

    pub fn record_admission(&self, outcome: &'static str) {
        self.admission_decisions_total
            .add(1, &[KeyValue::new(labels::OUTCOME, outcome)]);
    }

    pub fn record_rate_limit_evictions(&self, count: u64) {
        if count > 0 {
            self.rate_limit_evictions_total.add(count, &[]);
        }
    }

    pub fn record_tracked_identities(&self, count: u64) {
        self.rate_limit_identities.record(count, &[]);
    }

    pub fn record_connection_opened(&self) {
        self.connections_total.add(1, &[]);
        self.connections_active.add(1, &[]);
    }

    pub fn record_connection_closed(&self) {
        self.connections_active.add(-1, &[]);
    }

    pub fn record_request(&self, method: &str, status_code: u16, protocol: &str, duration: f64) {
        let attrs = [
            KeyValue::new(labels::METHOD, method.to_string()),
            KeyValue::new(labels::STATUS_CODE, status_code.to_string()),
            KeyValue::new(labels::PROTOCOL, protocol.to_string()),
        ];
        self.requests_total.add(1, &attrs);
        self.requests_duration_seconds.record(duration, &attrs);
    }

    pub fn record_backend_error(&self, backend: &str, error_type: &'static str) {
        self.backend_errors_total.add(
            1,
            &[
                KeyValue::new(labels::BACKEND_ADDRESS, backend.to_string()),
                KeyValue::new(labels::ERROR_TYPE, error_type),
            ],
        );
    }
}

/// Install the Prometheus-backed meter provider and build the metric set.
pub fn init_metrics() -> Result<(Arc<Metrics>, Registry)> {
    let registry = Registry::default();

    let exporter = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .build()
        .map_err(|e| ProxyError::Telemetry(format!("Failed to build Prometheus exporter: {e}")))?;

    let meter_provider = SdkMeterProvider::builder().with_reader(exporter).build();

    global::set_meter_provider(meter_provider);

    let meter = global::meter("front-proxy");
    let metrics = Arc::new(Metrics::new(meter));

    metrics.set_build_info();

    Ok((metrics, registry))
}
