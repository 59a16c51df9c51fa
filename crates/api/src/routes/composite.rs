//! Product composite endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{OriginalUri, Path, State};
use axum::http::StatusCode;
use common::ProductAggregate;

use crate::error::ApiError;
use crate::wiring::System;

fn parse_product_id(raw: &str, path: &str) -> Result<i32, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(path, "Type mismatch."))
}

/// GET /product-composite/{productId} — the composite read.
#[tracing::instrument(skip(system))]
pub async fn get(
    State(system): State<Arc<System>>,
    OriginalUri(uri): OriginalUri,
    Path(product_id): Path<String>,
) -> Result<Json<ProductAggregate>, ApiError> {
    let path = uri.path();
    let product_id = parse_product_id(&product_id, path)?;
    system
        .composite
        .get_product(product_id)
        .await
        .map(Json)
        .map_err(|err| ApiError::from_service(err, path))
}

/// POST /product-composite — asynchronous composite create.
///
/// 202 means every event was accepted for transport, not that the entities
/// are persisted yet.
#[tracing::instrument(skip(system, body), fields(product_id = body.product_id))]
pub async fn create(
    State(system): State<Arc<System>>,
    OriginalUri(uri): OriginalUri,
    Json(body): Json<ProductAggregate>,
) -> Result<StatusCode, ApiError> {
    system
        .composite
        .create_product(body)
        .await
        .map(|()| StatusCode::ACCEPTED)
        .map_err(|err| ApiError::from_service(err, uri.path()))
}

/// DELETE /product-composite/{productId} — asynchronous composite delete.
#[tracing::instrument(skip(system))]
pub async fn delete(
    State(system): State<Arc<System>>,
    OriginalUri(uri): OriginalUri,
    Path(product_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let path = uri.path();
    let product_id = parse_product_id(&product_id, path)?;
    system
        .composite
        .delete_product(product_id)
        .await
        .map(|()| StatusCode::ACCEPTED)
        .map_err(|err| ApiError::from_service(err, path))
}
