//! HTTP surface for the product composite system.
//!
//! Exposes the composite read/write endpoints, the entity services' read
//! endpoints, aggregated health and Prometheus metrics, with structured
//! logging (tracing) on every request.

pub mod config;
pub mod error;
pub mod routes;
pub mod wiring;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use wiring::{Composite, InProcessTransport, System, build_system};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(system: Arc<System>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/product-composite", post(routes::composite::create))
        .route(
            "/product-composite/{productId}",
            get(routes::composite::get).delete(routes::composite::delete),
        )
        .route("/product/{productId}", get(routes::core::get_product))
        .route("/recommendation", get(routes::core::get_recommendations))
        .route("/review", get(routes::core::get_reviews))
        .with_state(system)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
