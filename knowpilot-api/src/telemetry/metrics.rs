//! Prometheus metrics for the API, the generation client and enrichment
//! runs, served as text at `GET /metrics`.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// Request latency buckets in seconds. The long tail is for bulk runs,
/// which call the model once per item.
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
    300.0,
];

/// Generation call latency buckets (seconds), up to the 60s default timeout
const GENERATION_LATENCY_BUCKETS: &[f64] = &[0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0, 60.0];

/// Registered on first use.
pub static METRICS: Lazy<ApiResult<KnowPilotMetrics>> = Lazy::new(KnowPilotMetrics::new);

/// Container for all KnowPilot metrics.
#[derive(Clone)]
pub struct KnowPilotMetrics {
    /// labels: method, path, status
    pub http_requests_total: CounterVec,

    /// labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Generation service calls - labels: provider, outcome
    pub generation_calls_total: CounterVec,

    /// Generation call duration histogram - labels: provider, outcome
    pub generation_duration_seconds: HistogramVec,

    /// Per-item enrichment outcomes - labels: kind, outcome
    pub enrichment_outcomes_total: CounterVec,
}

impl KnowPilotMetrics {
    /// Register every metric in the default Prometheus registry.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "knowpilot_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| register_failed("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "knowpilot_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| register_failed("http_request_duration_seconds", e))?,

            generation_calls_total: register_counter_vec!(
                "knowpilot_generation_calls_total",
                "Total number of text generation calls",
                &["provider", "outcome"]
            )
            .map_err(|e| register_failed("generation_calls_total", e))?,

            generation_duration_seconds: register_histogram_vec!(
                "knowpilot_generation_duration_seconds",
                "Text generation call duration in seconds",
                &["provider", "outcome"],
                GENERATION_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| register_failed("generation_duration_seconds", e))?,

            enrichment_outcomes_total: register_counter_vec!(
                "knowpilot_enrichment_outcomes_total",
                "Per-item enrichment outcomes",
                &["kind", "outcome"]
            )
            .map_err(|e| register_failed("enrichment_outcomes_total", e))?,
        })
    }

    /// Count one finished request and observe its latency.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record one call to the generation service.
    pub fn record_generation(&self, provider: &str, success: bool, duration_secs: f64) {
        let outcome = if success { "success" } else { "error" };
        self.generation_calls_total
            .with_label_values(&[provider, outcome])
            .inc();
        self.generation_duration_seconds
            .with_label_values(&[provider, outcome])
            .observe(duration_secs);
    }

    /// Record the outcome of enriching one item or row.
    pub fn record_enrichment(&self, kind: &str, outcome: &str) {
        self.enrichment_outcomes_total
            .with_label_values(&[kind, outcome])
            .inc();
    }
}

fn register_failed(name: &str, err: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, err))
}

/// Run `f` against the global metrics. Registration failures were already
/// reported at startup, so they are skipped silently here.
pub fn with_metrics(f: impl FnOnce(&KnowPilotMetrics)) {
    if let Ok(metrics) = METRICS.as_ref() {
        f(metrics);
    }
}

/// GET /metrics - Prometheus text exposition
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
)]
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::core::Collector;

    fn metrics() -> Result<&'static KnowPilotMetrics, String> {
        METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.detail))
    }

    #[test]
    fn test_metrics_creation() -> Result<(), String> {
        let metrics = metrics()?;
        assert!(!metrics.http_requests_total.desc().is_empty());
        Ok(())
    }

    #[test]
    fn test_record_generation_counts_by_outcome() -> Result<(), String> {
        let metrics = metrics()?;
        let before = metrics
            .generation_calls_total
            .with_label_values(&["unit-test", "error"])
            .get();
        metrics.record_generation("unit-test", false, 0.2);
        let after = metrics
            .generation_calls_total
            .with_label_values(&["unit-test", "error"])
            .get();
        assert_eq!(after - before, 1.0);
        Ok(())
    }

    #[test]
    fn test_record_enrichment_and_http() -> Result<(), String> {
        let metrics = metrics()?;
        metrics.record_enrichment("qa", "updated");
        metrics.record_http_request("GET", "/contents/{id}", 200, 0.015);
        Ok(())
    }

    #[tokio::test]
    async fn test_metrics_handler_renders_text() -> Result<(), String> {
        metrics()?.record_enrichment("knowledge_point", "parse_failed");
        let response = metrics_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| e.to_string())?;
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("knowpilot_enrichment_outcomes_total"));
        Ok(())
    }
}
