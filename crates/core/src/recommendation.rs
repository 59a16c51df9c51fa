//! Recommendation entity service: one of the two dependent collections.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{Recommendation, Result, ServiceError, ServiceUtil};
use event_channel::{Event, EventConsumer, EventType};
use tokio::sync::RwLock;

use crate::error::RepositoryError;

/// Storage seam for recommendations, keyed by (product_id, recommendation_id).
#[async_trait]
pub trait RecommendationRepository: Send + Sync {
    /// Returns the recommendations for a product in insertion order.
    async fn find_by_product_id(&self, product_id: i32) -> Vec<Recommendation>;

    async fn insert(
        &self,
        recommendation: Recommendation,
    ) -> std::result::Result<(), RepositoryError>;

    /// Removes every recommendation for the product; zero matches is fine.
    async fn delete_by_product_id(&self, product_id: i32);
}

/// In-memory recommendation repository.
#[derive(Clone, Default)]
pub struct InMemoryRecommendationRepository {
    records: Arc<RwLock<HashMap<i32, Vec<Recommendation>>>>,
}

impl InMemoryRecommendationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of recommendations stored for a product.
    pub async fn count_for_product(&self, product_id: i32) -> usize {
        self.records
            .read()
            .await
            .get(&product_id)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl RecommendationRepository for InMemoryRecommendationRepository {
    async fn find_by_product_id(&self, product_id: i32) -> Vec<Recommendation> {
        self.records
            .read()
            .await
            .get(&product_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn insert(
        &self,
        recommendation: Recommendation,
    ) -> std::result::Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        let list = records.entry(recommendation.product_id).or_default();
        if list
            .iter()
            .any(|r| r.recommendation_id == recommendation.recommendation_id)
        {
            return Err(RepositoryError::DuplicateKey);
        }
        list.push(recommendation);
        Ok(())
    }

    async fn delete_by_product_id(&self, product_id: i32) {
        self.records.write().await.remove(&product_id);
    }
}

/// Serves recommendation reads and applies recommendation write events.
#[derive(Clone)]
pub struct RecommendationService<R> {
    repository: R,
    service_util: ServiceUtil,
}

impl<R: RecommendationRepository> RecommendationService<R> {
    pub fn new(repository: R, service_util: ServiceUtil) -> Self {
        Self {
            repository,
            service_util,
        }
    }

    /// Returns the recommendations for `product_id`. A product without
    /// recommendations yields an empty list, not an error.
    pub async fn get_recommendations(&self, product_id: i32) -> Result<Vec<Recommendation>> {
        if product_id < 1 {
            return Err(ServiceError::invalid_input(format!(
                "Invalid productId: {product_id}"
            )));
        }
        let mut list = self.repository.find_by_product_id(product_id).await;
        for recommendation in &mut list {
            recommendation.service_address =
                Some(self.service_util.service_address().to_string());
        }
        tracing::debug!(product_id, size = list.len(), "recommendation read");
        Ok(list)
    }

    async fn create_recommendation(&self, recommendation: Recommendation) -> Result<()> {
        let product_id = recommendation.product_id;
        let recommendation_id = recommendation.recommendation_id;
        self.repository.insert(recommendation).await.map_err(|_| {
            ServiceError::invalid_input(format!(
                "Duplicate key, Product Id: {product_id}, Recommendation Id: {recommendation_id}"
            ))
        })?;
        metrics::counter!("entity_creates_total", "entity" => "recommendation").increment(1);
        tracing::debug!(product_id, recommendation_id, "created recommendation entity");
        Ok(())
    }

    async fn delete_recommendations(&self, product_id: i32) -> Result<()> {
        tracing::debug!(product_id, "deleting recommendations for product");
        self.repository.delete_by_product_id(product_id).await;
        metrics::counter!("entity_deletes_total", "entity" => "recommendation").increment(1);
        Ok(())
    }
}

/// Applies CREATE/DELETE events from the `recommendations` binding.
#[derive(Clone)]
pub struct RecommendationEventConsumer<R> {
    service: RecommendationService<R>,
}

impl<R: RecommendationRepository> RecommendationEventConsumer<R> {
    pub fn new(service: RecommendationService<R>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<R: RecommendationRepository> EventConsumer for RecommendationEventConsumer<R> {
    async fn consume(&self, event: Event) -> Result<()> {
        tracing::debug!(key = event.key, event_type = %event.event_type, "processing recommendation event");
        match event.event_type {
            EventType::Create => {
                let payload = event.payload.ok_or_else(|| {
                    ServiceError::unexpected(format!(
                        "CREATE event without payload, key: {}",
                        event.key
                    ))
                })?;
                let recommendation: Recommendation =
                    serde_json::from_value(payload).map_err(|err| {
                        ServiceError::unexpected(format!(
                            "Malformed recommendation payload: {err}"
                        ))
                    })?;
                self.service.create_recommendation(recommendation).await
            }
            EventType::Delete => self.service.delete_recommendations(event.key).await,
        }
    }
}
