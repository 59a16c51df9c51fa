//! The aggregator: composite reads and event-driven composite writes.

use std::time::Duration;

use common::{
    Product, ProductAggregate, Recommendation, RecommendationSummary, Result, Review,
    ReviewSummary, ServiceAddresses, ServiceError, ServiceUtil,
};
use event_channel::{Event, EventPublisher};
use futures_util::future::try_join_all;

use crate::gateway::{HealthProbe, ProductReads, RecommendationReads, ReviewReads};
use crate::health::{HealthReport, Status};

pub const PRODUCTS_BINDING: &str = "products-out-0";
pub const RECOMMENDATIONS_BINDING: &str = "recommendations-out-0";
pub const REVIEWS_BINDING: &str = "reviews-out-0";

const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(1);

/// Orchestrates reads and writes across the three backing services.
///
/// Reads fan out concurrently and join with per-branch isolation: a root
/// failure fails the whole call, collection failures were already degraded
/// to empty sequences by the gateway. Writes decompose into events published
/// concurrently; acceptance of every publish completes the call, with no
/// rollback of the events already accepted when one fails.
pub struct ProductCompositeService<G, P> {
    integration: G,
    publisher: P,
    service_util: ServiceUtil,
    health_timeout: Duration,
}

impl<G, P> ProductCompositeService<G, P>
where
    G: ProductReads + RecommendationReads + ReviewReads + HealthProbe,
    P: EventPublisher,
{
    pub fn new(integration: G, publisher: P, service_util: ServiceUtil) -> Self {
        Self {
            integration,
            publisher,
            service_util,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
        }
    }

    /// Overrides the per-probe health timeout.
    pub fn with_health_timeout(mut self, health_timeout: Duration) -> Self {
        self.health_timeout = health_timeout;
        self
    }

    /// Builds the composite view for `product_id`.
    ///
    /// The three fetches run concurrently and all settle before the result
    /// is assembled; dropping the returned future tears down every branch.
    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, product_id: i32) -> Result<ProductAggregate> {
        if product_id < 1 {
            return Err(ServiceError::invalid_input(format!(
                "Invalid productId: {product_id}"
            )));
        }
        metrics::counter!("composite_reads_total").increment(1);

        let (product, recommendations, reviews) = tokio::join!(
            self.integration.get_product(product_id),
            self.integration.get_recommendations(product_id),
            self.integration.get_reviews(product_id),
        );
        let product = product?;

        Ok(self.build_aggregate(product, recommendations, reviews))
    }

    fn build_aggregate(
        &self,
        product: Product,
        recommendations: Vec<Recommendation>,
        reviews: Vec<Review>,
    ) -> ProductAggregate {
        let first_address =
            |address: Option<&Option<String>>| address.and_then(Clone::clone).unwrap_or_default();

        let service_addresses = ServiceAddresses {
            composite: self.service_util.service_address().to_string(),
            product: product.service_address.clone().unwrap_or_default(),
            recommendation: first_address(
                recommendations.first().map(|r| &r.service_address),
            ),
            review: first_address(reviews.first().map(|r| &r.service_address)),
        };

        ProductAggregate {
            product_id: product.product_id,
            name: product.name,
            weight: product.weight,
            recommendations: recommendations.iter().map(RecommendationSummary::from).collect(),
            reviews: reviews.iter().map(ReviewSummary::from).collect(),
            service_addresses: Some(service_addresses),
        }
    }

    /// Decomposes the aggregate into one CREATE event per entity and
    /// publishes them all concurrently.
    ///
    /// Completes once every publish is transport-accepted; the first publish
    /// failure fails the call with no compensation for events already
    /// accepted. All events carry the product id as partition key, so each
    /// binding applies its own events in publish order, but no ordering
    /// exists between the root create and its dependents' creates.
    #[tracing::instrument(skip(self, body), fields(product_id = body.product_id))]
    pub async fn create_product(&self, body: ProductAggregate) -> Result<()> {
        tracing::debug!("createCompositeProduct: creating composite entities");
        metrics::counter!("composite_creates_total").increment(1);

        let product_id = body.product_id;
        let mut events = Vec::with_capacity(1 + body.recommendations.len() + body.reviews.len());

        let product = Product::new(product_id, body.name.clone(), body.weight);
        events.push((PRODUCTS_BINDING, new_create_event(product_id, &product)?));

        for summary in &body.recommendations {
            let recommendation = Recommendation {
                product_id,
                recommendation_id: summary.recommendation_id,
                author: summary.author.clone(),
                rate: summary.rate,
                content: summary.content.clone(),
                service_address: None,
            };
            events.push((
                RECOMMENDATIONS_BINDING,
                new_create_event(product_id, &recommendation)?,
            ));
        }

        for summary in &body.reviews {
            let review = Review {
                product_id,
                review_id: summary.review_id,
                author: summary.author.clone(),
                subject: summary.subject.clone(),
                content: summary.content.clone(),
                service_address: None,
            };
            events.push((REVIEWS_BINDING, new_create_event(product_id, &review)?));
        }

        try_join_all(
            events
                .into_iter()
                .map(|(binding, event)| self.send_event(binding, event)),
        )
        .await?;

        tracing::debug!("createCompositeProduct: composite entities created");
        Ok(())
    }

    /// Publishes one DELETE per entity type, unconditionally and
    /// concurrently. Idempotent: deleting an absent aggregate is a no-op at
    /// every consumer.
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, product_id: i32) -> Result<()> {
        tracing::debug!("deleteCompositeProduct: deleting composite entities");
        metrics::counter!("composite_deletes_total").increment(1);

        try_join_all([
            self.send_event(PRODUCTS_BINDING, Event::delete(product_id)),
            self.send_event(RECOMMENDATIONS_BINDING, Event::delete(product_id)),
            self.send_event(REVIEWS_BINDING, Event::delete(product_id)),
        ])
        .await?;
        Ok(())
    }

    /// Probes the three backing services concurrently, each under its own
    /// timeout. Never fails: an unreachable or slow dependency just reports
    /// DOWN.
    #[tracing::instrument(skip(self))]
    pub async fn get_health(&self) -> HealthReport {
        let (product, recommendation, review) = tokio::join!(
            bounded(self.health_timeout, self.integration.product_health()),
            bounded(self.health_timeout, self.integration.recommendation_health()),
            bounded(self.health_timeout, self.integration.review_health()),
        );
        HealthReport::new(product, recommendation, review)
    }

    async fn send_event(&self, binding: &'static str, event: Event) -> Result<()> {
        tracing::debug!(binding, event_type = %event.event_type, key = event.key, "sending event");
        self.publisher
            .publish(binding, event)
            .await
            .map_err(|err| {
                ServiceError::unavailable(format!("Event publish failed on {binding}: {err}"))
            })
    }
}

fn new_create_event<T: serde::Serialize>(key: i32, payload: &T) -> Result<Event> {
    Event::create(key, payload)
        .map_err(|err| ServiceError::unexpected(format!("Failed to serialize event payload: {err}")))
}

async fn bounded(timeout: Duration, probe: impl Future<Output = Status>) -> Status {
    match tokio::time::timeout(timeout, probe).await {
        Ok(status) => status,
        Err(_) => Status::Down,
    }
}
