//! # Prometheus Metrics
//!
//! Operational metrics for the Construction API, served at `/metrics` on the
//! metrics port. All metrics live in a dedicated [`prometheus::Registry`]
//! prefixed `zil_rosetta`.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

use zil_construction::ConstructionError;

/// Metric handles shared by the request handlers and the mempool sweeper.
#[derive(Clone)]
pub struct ServerMetrics {
    registry: Registry,
    /// Requests per construction stage.
    pub requests_total: IntCounterVec,
    /// Failed requests per stage and error code.
    pub errors_total: IntCounterVec,
    /// Transactions newly accepted by submit.
    pub transactions_submitted_total: IntCounter,
    /// Current number of transactions in the mempool.
    pub transactions_in_mempool: IntGauge,
    /// Handler latency per stage, in seconds.
    pub stage_latency_seconds: HistogramVec,
}

impl ServerMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("zil_rosetta".into()), None)
            .expect("failed to create prometheus registry");

        let requests_total = IntCounterVec::new(
            Opts::new(
                "construction_requests_total",
                "Construction API requests by stage",
            ),
            &["stage"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(requests_total.clone()))
            .expect("metric registration");

        let errors_total = IntCounterVec::new(
            Opts::new(
                "construction_errors_total",
                "Construction API errors by stage and error code",
            ),
            &["stage", "code"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(errors_total.clone()))
            .expect("metric registration");

        let transactions_submitted_total = IntCounter::new(
            "transactions_submitted_total",
            "Transactions newly accepted through /construction/submit",
        )
        .expect("metric creation");
        registry
            .register(Box::new(transactions_submitted_total.clone()))
            .expect("metric registration");

        let transactions_in_mempool = IntGauge::new(
            "transactions_in_mempool",
            "Current number of transactions held in the mempool",
        )
        .expect("metric creation");
        registry
            .register(Box::new(transactions_in_mempool.clone()))
            .expect("metric registration");

        let stage_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "construction_stage_latency_seconds",
                "Construction API handler latency in seconds",
            )
            .buckets(vec![
                0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["stage"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(stage_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            requests_total,
            errors_total,
            transactions_submitted_total,
            transactions_in_mempool,
            stage_latency_seconds,
        }
    }

    /// Records one finished request for `stage`.
    pub fn observe(&self, stage: &str, elapsed: Duration, error: Option<&ConstructionError>) {
        self.requests_total.with_label_values(&[stage]).inc();
        self.stage_latency_seconds
            .with_label_values(&[stage])
            .observe(elapsed.as_secs_f64());
        if let Some(err) = error {
            self.errors_total
                .with_label_values(&[stage, &err.code().to_string()])
                .inc();
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

pub type SharedMetrics = Arc<ServerMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
