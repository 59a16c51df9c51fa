//! In-process assembly of the whole dependency graph.
//!
//! One process hosts the composite and the three entity services, wired by
//! explicit constructor injection. The gateway still goes through its
//! [`Transport`] seam: [`InProcessTransport`] resolves the logical service
//! URLs to direct calls and renders entity-service errors as the structured
//! HTTP error body, so the gateway's status mapping is exercised exactly as
//! it would be over a network.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{ErrorKind, HttpErrorInfo, ServiceError, ServiceUtil};
use composite::{
    CoreGateway, PRODUCTS_BINDING, ProductCompositeService, RECOMMENDATIONS_BINDING,
    REVIEWS_BINDING, Transport, TransportError,
};
use core_services::{
    InMemoryProductRepository, InMemoryRecommendationRepository, InMemoryReviewRepository,
    ProductEventConsumer, ProductService, RecommendationEventConsumer, RecommendationService,
    ReviewEventConsumer, ReviewService,
};
use event_channel::InMemoryChannel;

use crate::config::Config;

/// The concrete composite service this process runs.
pub type Composite =
    ProductCompositeService<CoreGateway<InProcessTransport>, InMemoryChannel>;

/// Transport that dispatches gateway URLs to the in-process entity services.
///
/// Entity-service failures come back as [`TransportError::Status`] with an
/// `HttpErrorInfo` JSON body, the same shape a remote deployment would put
/// on the wire. Individual services can be marked unreachable to exercise
/// the degrade and health paths.
#[derive(Clone)]
pub struct InProcessTransport {
    product: ProductService<InMemoryProductRepository>,
    recommendation: RecommendationService<InMemoryRecommendationRepository>,
    review: ReviewService<InMemoryReviewRepository>,
    down: Arc<RwLock<HashSet<String>>>,
}

impl InProcessTransport {
    pub fn new(
        product: ProductService<InMemoryProductRepository>,
        recommendation: RecommendationService<InMemoryRecommendationRepository>,
        review: ReviewService<InMemoryReviewRepository>,
    ) -> Self {
        Self {
            product,
            recommendation,
            review,
            down: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Marks a logical service (`"product"`, `"recommendation"`, `"review"`)
    /// unreachable until [`Self::set_up`] is called.
    pub fn set_down(&self, service: &str) {
        self.down.write().unwrap().insert(service.to_string());
    }

    /// Marks a logical service reachable again.
    pub fn set_up(&self, service: &str) {
        self.down.write().unwrap().remove(service);
    }

    fn render_error(err: ServiceError, path: &str) -> TransportError {
        let status: u16 = match err.kind() {
            ErrorKind::InvalidInput => 422,
            ErrorKind::NotFound => 404,
            ErrorKind::Unavailable | ErrorKind::Unexpected => 500,
        };
        let info = HttpErrorInfo::new(path, status, "error", err.message());
        TransportError::Status {
            status,
            body: serde_json::to_string(&info).unwrap_or_default(),
        }
    }
}

fn parse_id(raw: &str, url: &str) -> Result<i32, TransportError> {
    raw.parse()
        .map_err(|_| TransportError::Connect(format!("Malformed request URL: {url}")))
}

#[async_trait]
impl Transport for InProcessTransport {
    async fn get_json(&self, url: &str) -> Result<serde_json::Value, TransportError> {
        let rest = url
            .strip_prefix("http://")
            .ok_or_else(|| TransportError::Connect(format!("No route to {url}")))?;
        let (host, path) = rest
            .split_once('/')
            .ok_or_else(|| TransportError::Connect(format!("No route to {url}")))?;

        if self.down.read().unwrap().contains(host) {
            return Err(TransportError::Connect(format!("Connection refused: {url}")));
        }

        if path == "actuator/health" {
            return Ok(serde_json::json!({"status": "UP"}));
        }

        match (host, path.split_once('/'), path.split_once("?productId=")) {
            ("product", Some(("product", id)), _) => {
                let product_id = parse_id(id, url)?;
                let product = self
                    .product
                    .get_product(product_id)
                    .await
                    .map_err(|err| Self::render_error(err, &format!("/product/{id}")))?;
                serde_json::to_value(product)
                    .map_err(|err| TransportError::Connect(err.to_string()))
            }
            ("recommendation", _, Some(("recommendation", id))) => {
                let product_id = parse_id(id, url)?;
                let list = self
                    .recommendation
                    .get_recommendations(product_id)
                    .await
                    .map_err(|err| Self::render_error(err, "/recommendation"))?;
                serde_json::to_value(list)
                    .map_err(|err| TransportError::Connect(err.to_string()))
            }
            ("review", _, Some(("review", id))) => {
                let product_id = parse_id(id, url)?;
                let list = self
                    .review
                    .get_reviews(product_id)
                    .await
                    .map_err(|err| Self::render_error(err, "/review"))?;
                serde_json::to_value(list)
                    .map_err(|err| TransportError::Connect(err.to_string()))
            }
            _ => Err(TransportError::Connect(format!("No route to {url}"))),
        }
    }
}

/// Everything the process needs, assembled once at startup.
pub struct System {
    pub composite: Composite,
    pub product_service: ProductService<InMemoryProductRepository>,
    pub recommendation_service: RecommendationService<InMemoryRecommendationRepository>,
    pub review_service: ReviewService<InMemoryReviewRepository>,
    pub product_repository: InMemoryProductRepository,
    pub recommendation_repository: InMemoryRecommendationRepository,
    pub review_repository: InMemoryReviewRepository,
    pub channel: InMemoryChannel,
    pub transport: InProcessTransport,
}

/// Builds repositories, services, consumers, channel bindings, gateway and
/// aggregator. No ambient registry: every dependency is passed explicitly.
pub fn build_system(config: &Config) -> Arc<System> {
    let channel = InMemoryChannel::new();

    let product_repository = InMemoryProductRepository::new();
    let product_service =
        ProductService::new(product_repository.clone(), ServiceUtil::new(7001));
    channel.register(
        PRODUCTS_BINDING,
        Arc::new(ProductEventConsumer::new(product_service.clone())),
    );

    let recommendation_repository = InMemoryRecommendationRepository::new();
    let recommendation_service =
        RecommendationService::new(recommendation_repository.clone(), ServiceUtil::new(7002));
    channel.register(
        RECOMMENDATIONS_BINDING,
        Arc::new(RecommendationEventConsumer::new(
            recommendation_service.clone(),
        )),
    );

    let review_repository = InMemoryReviewRepository::new();
    let review_service =
        ReviewService::new(review_repository.clone(), ServiceUtil::new(7003));
    channel.register(
        REVIEWS_BINDING,
        Arc::new(ReviewEventConsumer::new(review_service.clone())),
    );

    let transport = InProcessTransport::new(
        product_service.clone(),
        recommendation_service.clone(),
        review_service.clone(),
    );
    let gateway = CoreGateway::new(transport.clone());
    let composite =
        ProductCompositeService::new(gateway, channel.clone(), ServiceUtil::new(7000))
            .with_health_timeout(config.health_timeout);

    Arc::new(System {
        composite,
        product_service,
        recommendation_service,
        review_service,
        product_repository,
        recommendation_repository,
        review_repository,
        channel,
        transport,
    })
}
