//! Prometheus metrics endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// GET /metrics — renders the process counters in Prometheus exposition
/// format: the composite operation counters (`composite_reads_total`,
/// `composite_creates_total`, `composite_deletes_total`), the per-entity
/// write counters (`entity_creates_total`, `entity_deletes_total`) and the
/// channel delivery counters (`events_published_total`,
/// `events_consumed_total`, `events_failed_total`).
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        handle.render(),
    )
}
