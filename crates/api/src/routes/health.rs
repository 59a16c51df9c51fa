//! Aggregated health endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use composite::HealthReport;

use crate::wiring::System;

/// GET /health — per-dependency health; always answers 200.
pub async fn check(State(system): State<Arc<System>>) -> Json<HealthReport> {
    Json(system.composite.get_health().await)
}
