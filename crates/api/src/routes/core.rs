//! Synchronous read endpoints of the three entity services.

use std::sync::Arc;

use axum::Json;
use axum::extract::{OriginalUri, Path, Query, State};
use common::{Product, Recommendation, Review};
use serde::Deserialize;

use crate::error::ApiError;
use crate::wiring::System;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductIdParam {
    product_id: String,
}

fn parse_product_id(raw: &str, path: &str) -> Result<i32, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(path, "Type mismatch."))
}

/// GET /product/{productId}
pub async fn get_product(
    State(system): State<Arc<System>>,
    OriginalUri(uri): OriginalUri,
    Path(product_id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let path = uri.path();
    let product_id = parse_product_id(&product_id, path)?;
    system
        .product_service
        .get_product(product_id)
        .await
        .map(Json)
        .map_err(|err| ApiError::from_service(err, path))
}

/// GET /recommendation?productId={id}
pub async fn get_recommendations(
    State(system): State<Arc<System>>,
    OriginalUri(uri): OriginalUri,
    Query(param): Query<ProductIdParam>,
) -> Result<Json<Vec<Recommendation>>, ApiError> {
    let path = uri.path();
    let product_id = parse_product_id(&param.product_id, path)?;
    system
        .recommendation_service
        .get_recommendations(product_id)
        .await
        .map(Json)
        .map_err(|err| ApiError::from_service(err, path))
}

/// GET /review?productId={id}
pub async fn get_reviews(
    State(system): State<Arc<System>>,
    OriginalUri(uri): OriginalUri,
    Query(param): Query<ProductIdParam>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let path = uri.path();
    let product_id = parse_product_id(&param.product_id, path)?;
    system
        .review_service
        .get_reviews(product_id)
        .await
        .map(Json)
        .map_err(|err| ApiError::from_service(err, path))
}
