//! Backing service gateway.
//!
//! One read capability per trait, all composed by [`CoreGateway`], which
//! maps transport failures to the shared error taxonomy. The degrade policy
//! lives here: dependent-collection reads absorb every failure into an empty
//! sequence before the aggregator sees anything.

use async_trait::async_trait;
use common::{HttpErrorInfo, Product, Recommendation, Result, Review, ServiceError};

use crate::health::Status;
use crate::transport::{Transport, TransportError};

pub const PRODUCT_SERVICE_URL: &str = "http://product";
pub const RECOMMENDATION_SERVICE_URL: &str = "http://recommendation";
pub const REVIEW_SERVICE_URL: &str = "http://review";

/// Read capability for the root product entity.
#[async_trait]
pub trait ProductReads: Send + Sync {
    async fn get_product(&self, product_id: i32) -> Result<Product>;
}

/// Read capability for the recommendation collection.
///
/// Infallible by contract: any failure degrades to an empty list.
#[async_trait]
pub trait RecommendationReads: Send + Sync {
    async fn get_recommendations(&self, product_id: i32) -> Vec<Recommendation>;
}

/// Read capability for the review collection.
///
/// Infallible by contract: any failure degrades to an empty list.
#[async_trait]
pub trait ReviewReads: Send + Sync {
    async fn get_reviews(&self, product_id: i32) -> Vec<Review>;
}

/// Health probes for the three backing services.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn product_health(&self) -> Status;
    async fn recommendation_health(&self) -> Status;
    async fn review_health(&self) -> Status;
}

/// Gateway to the three backing services over a [`Transport`].
#[derive(Clone)]
pub struct CoreGateway<T> {
    transport: T,
}

impl<T: Transport> CoreGateway<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    async fn health_of(&self, base_url: &str) -> Status {
        let url = format!("{base_url}/actuator/health");
        tracing::debug!(%url, "calling health endpoint");
        match self.transport.get_json(&url).await {
            Ok(_) => Status::Up,
            Err(err) => {
                tracing::warn!(%url, error = %err, "health probe failed");
                Status::Down
            }
        }
    }
}

/// Maps a root-read transport failure to its domain error.
///
/// 404 and 422 carry a structured error body from the entity service; the
/// message is taken from there when it parses, otherwise from the raw
/// transport error. Anything else passes through as Unavailable/Unexpected.
fn map_root_error(err: TransportError) -> ServiceError {
    match &err {
        TransportError::Status { status: 404, body } => {
            ServiceError::not_found(error_message(body, &err))
        }
        TransportError::Status { status: 422, body } => {
            ServiceError::invalid_input(error_message(body, &err))
        }
        TransportError::Status { status, body } => {
            tracing::warn!(status, "Got an unexpected HTTP error, will rethrow it");
            tracing::warn!(%body, "Error body");
            ServiceError::unexpected(err.to_string())
        }
        TransportError::Connect(_) => {
            tracing::warn!(error = %err, "Got an unexpected error, will rethrow it");
            ServiceError::unavailable(err.to_string())
        }
    }
}

fn error_message(body: &str, err: &TransportError) -> String {
    serde_json::from_str::<HttpErrorInfo>(body)
        .map(|info| info.message)
        .unwrap_or_else(|_| err.to_string())
}

#[async_trait]
impl<T: Transport> ProductReads for CoreGateway<T> {
    async fn get_product(&self, product_id: i32) -> Result<Product> {
        let url = format!("{PRODUCT_SERVICE_URL}/product/{product_id}");
        tracing::debug!(%url, "calling getProduct API");
        let body = self.transport.get_json(&url).await.map_err(map_root_error)?;
        serde_json::from_value(body)
            .map_err(|err| ServiceError::unexpected(format!("Malformed product response: {err}")))
    }
}

#[async_trait]
impl<T: Transport> RecommendationReads for CoreGateway<T> {
    async fn get_recommendations(&self, product_id: i32) -> Vec<Recommendation> {
        let url = format!("{RECOMMENDATION_SERVICE_URL}/recommendation?productId={product_id}");
        tracing::debug!(%url, "calling getRecommendations API");
        match self.transport.get_json(&url).await {
            Ok(body) => serde_json::from_value(body).unwrap_or_else(|err| {
                tracing::warn!(product_id, error = %err, "malformed recommendation response, returning empty list");
                Vec::new()
            }),
            Err(err) => {
                tracing::warn!(product_id, error = %err, "recommendation read failed, returning empty list");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl<T: Transport> ReviewReads for CoreGateway<T> {
    async fn get_reviews(&self, product_id: i32) -> Vec<Review> {
        let url = format!("{REVIEW_SERVICE_URL}/review?productId={product_id}");
        tracing::debug!(%url, "calling getReviews API");
        match self.transport.get_json(&url).await {
            Ok(body) => serde_json::from_value(body).unwrap_or_else(|err| {
                tracing::warn!(product_id, error = %err, "malformed review response, returning empty list");
                Vec::new()
            }),
            Err(err) => {
                tracing::warn!(product_id, error = %err, "review read failed, returning empty list");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl<T: Transport> HealthProbe for CoreGateway<T> {
    async fn product_health(&self) -> Status {
        self.health_of(PRODUCT_SERVICE_URL).await
    }

    async fn recommendation_health(&self) -> Status {
        self.health_of(RECOMMENDATION_SERVICE_URL).await
    }

    async fn review_health(&self) -> Status {
        self.health_of(REVIEW_SERVICE_URL).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Transport that serves canned responses per URL.
    #[derive(Default)]
    struct MockTransport {
        responses: Mutex<HashMap<String, std::result::Result<serde_json::Value, TransportError>>>,
    }

    impl MockTransport {
        fn respond(&self, url: &str, response: std::result::Result<serde_json::Value, TransportError>) {
            self.responses.lock().unwrap().insert(url.to_string(), response);
        }
    }

    #[async_trait]
    impl Transport for &MockTransport {
        async fn get_json(&self, url: &str) -> std::result::Result<serde_json::Value, TransportError> {
            self.responses
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .unwrap_or_else(|| Err(TransportError::Connect(format!("no route to {url}"))))
        }
    }

    fn error_body(status: u16, message: &str) -> String {
        serde_json::to_string(&HttpErrorInfo::new("/product/13", status, "err", message)).unwrap()
    }

    #[tokio::test]
    async fn product_read_returns_entity() {
        let transport = MockTransport::default();
        transport.respond(
            "http://product/product/1",
            Ok(serde_json::json!({"productId": 1, "name": "Name 1", "weight": 1})),
        );
        let gateway = CoreGateway::new(&transport);

        let product = gateway.get_product(1).await.unwrap();
        assert_eq!(product.product_id, 1);
        assert_eq!(product.name, "Name 1");
    }

    #[tokio::test]
    async fn product_404_maps_to_not_found_with_body_message() {
        let transport = MockTransport::default();
        transport.respond(
            "http://product/product/13",
            Err(TransportError::Status {
                status: 404,
                body: error_body(404, "No product found for productId: 13"),
            }),
        );
        let gateway = CoreGateway::new(&transport);

        let err = gateway.get_product(13).await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::not_found("No product found for productId: 13")
        );
    }

    #[tokio::test]
    async fn product_422_maps_to_invalid_input() {
        let transport = MockTransport::default();
        transport.respond(
            "http://product/product/-1",
            Err(TransportError::Status {
                status: 422,
                body: error_body(422, "Invalid productId: -1"),
            }),
        );
        let gateway = CoreGateway::new(&transport);

        let err = gateway.get_product(-1).await.unwrap_err();
        assert_eq!(err, ServiceError::invalid_input("Invalid productId: -1"));
    }

    #[tokio::test]
    async fn unparseable_error_body_falls_back_to_raw_error() {
        let transport = MockTransport::default();
        transport.respond(
            "http://product/product/13",
            Err(TransportError::Status {
                status: 404,
                body: "not json".to_string(),
            }),
        );
        let gateway = CoreGateway::new(&transport);

        let err = gateway.get_product(13).await.unwrap_err();
        assert_eq!(err.kind(), common::ErrorKind::NotFound);
        assert!(err.message().contains("HTTP 404"));
    }

    #[tokio::test]
    async fn product_5xx_passes_through_as_unexpected() {
        let transport = MockTransport::default();
        transport.respond(
            "http://product/product/1",
            Err(TransportError::Status {
                status: 500,
                body: "boom".to_string(),
            }),
        );
        let gateway = CoreGateway::new(&transport);

        let err = gateway.get_product(1).await.unwrap_err();
        assert_eq!(err.kind(), common::ErrorKind::Unexpected);
    }

    #[tokio::test]
    async fn unreachable_product_service_is_unavailable() {
        let transport = MockTransport::default();
        let gateway = CoreGateway::new(&transport);

        let err = gateway.get_product(1).await.unwrap_err();
        assert_eq!(err.kind(), common::ErrorKind::Unavailable);
    }

    #[tokio::test]
    async fn collection_reads_absorb_every_failure() {
        let transport = MockTransport::default();
        transport.respond(
            "http://recommendation/recommendation?productId=1",
            Err(TransportError::Status {
                status: 500,
                body: "boom".to_string(),
            }),
        );
        // Review service gets no route at all.
        let gateway = CoreGateway::new(&transport);

        assert!(gateway.get_recommendations(1).await.is_empty());
        assert!(gateway.get_reviews(1).await.is_empty());
    }

    #[tokio::test]
    async fn collection_read_returns_sequence_in_source_order() {
        let transport = MockTransport::default();
        transport.respond(
            "http://review/review?productId=1",
            Ok(serde_json::json!([
                {"productId": 1, "reviewId": 2, "author": "a", "subject": "s", "content": "c"},
                {"productId": 1, "reviewId": 1, "author": "a", "subject": "s", "content": "c"}
            ])),
        );
        let gateway = CoreGateway::new(&transport);

        let reviews = gateway.get_reviews(1).await;
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].review_id, 2);
        assert_eq!(reviews[1].review_id, 1);
    }

    #[tokio::test]
    async fn health_probe_converts_failure_to_down() {
        let transport = MockTransport::default();
        transport.respond(
            "http://product/actuator/health",
            Ok(serde_json::json!({"status": "UP"})),
        );
        let gateway = CoreGateway::new(&transport);

        assert_eq!(gateway.product_health().await, Status::Up);
        assert_eq!(gateway.review_health().await, Status::Down);
    }
}
