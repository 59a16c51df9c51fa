//! Review entity service: the second dependent collection.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{Result, Review, ServiceError, ServiceUtil};
use event_channel::{Event, EventConsumer, EventType};
use tokio::sync::RwLock;

use crate::error::RepositoryError;

/// Storage seam for reviews, keyed by (product_id, review_id).
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Returns the reviews for a product in insertion order.
    async fn find_by_product_id(&self, product_id: i32) -> Vec<Review>;

    async fn insert(&self, review: Review) -> std::result::Result<(), RepositoryError>;

    /// Removes every review for the product; zero matches is fine.
    async fn delete_by_product_id(&self, product_id: i32);
}

/// In-memory review repository.
#[derive(Clone, Default)]
pub struct InMemoryReviewRepository {
    records: Arc<RwLock<HashMap<i32, Vec<Review>>>>,
}

impl InMemoryReviewRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of reviews stored for a product.
    pub async fn count_for_product(&self, product_id: i32) -> usize {
        self.records
            .read()
            .await
            .get(&product_id)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl ReviewRepository for InMemoryReviewRepository {
    async fn find_by_product_id(&self, product_id: i32) -> Vec<Review> {
        self.records
            .read()
            .await
            .get(&product_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn insert(&self, review: Review) -> std::result::Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        let list = records.entry(review.product_id).or_default();
        if list.iter().any(|r| r.review_id == review.review_id) {
            return Err(RepositoryError::DuplicateKey);
        }
        list.push(review);
        Ok(())
    }

    async fn delete_by_product_id(&self, product_id: i32) {
        self.records.write().await.remove(&product_id);
    }
}

/// Serves review reads and applies review write events.
#[derive(Clone)]
pub struct ReviewService<R> {
    repository: R,
    service_util: ServiceUtil,
}

impl<R: ReviewRepository> ReviewService<R> {
    pub fn new(repository: R, service_util: ServiceUtil) -> Self {
        Self {
            repository,
            service_util,
        }
    }

    /// Returns the reviews for `product_id`. A product without reviews
    /// yields an empty list, not an error.
    pub async fn get_reviews(&self, product_id: i32) -> Result<Vec<Review>> {
        if product_id < 1 {
            return Err(ServiceError::invalid_input(format!(
                "Invalid productId: {product_id}"
            )));
        }
        let mut list = self.repository.find_by_product_id(product_id).await;
        for review in &mut list {
            review.service_address = Some(self.service_util.service_address().to_string());
        }
        tracing::debug!(product_id, size = list.len(), "review read");
        Ok(list)
    }

    async fn create_review(&self, review: Review) -> Result<()> {
        let product_id = review.product_id;
        let review_id = review.review_id;
        self.repository.insert(review).await.map_err(|_| {
            ServiceError::invalid_input(format!(
                "Duplicate key, Product Id: {product_id}, Review Id: {review_id}"
            ))
        })?;
        metrics::counter!("entity_creates_total", "entity" => "review").increment(1);
        tracing::debug!(product_id, review_id, "created review entity");
        Ok(())
    }

    async fn delete_reviews(&self, product_id: i32) -> Result<()> {
        tracing::debug!(product_id, "deleting reviews for product");
        self.repository.delete_by_product_id(product_id).await;
        metrics::counter!("entity_deletes_total", "entity" => "review").increment(1);
        Ok(())
    }
}

/// Applies CREATE/DELETE events from the `reviews` binding.
#[derive(Clone)]
pub struct ReviewEventConsumer<R> {
    service: ReviewService<R>,
}

impl<R: ReviewRepository> ReviewEventConsumer<R> {
    pub fn new(service: ReviewService<R>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<R: ReviewRepository> EventConsumer for ReviewEventConsumer<R> {
    async fn consume(&self, event: Event) -> Result<()> {
        tracing::debug!(key = event.key, event_type = %event.event_type, "processing review event");
        match event.event_type {
            EventType::Create => {
                let payload = event.payload.ok_or_else(|| {
                    ServiceError::unexpected(format!(
                        "CREATE event without payload, key: {}",
                        event.key
                    ))
                })?;
                let review: Review = serde_json::from_value(payload).map_err(|err| {
                    ServiceError::unexpected(format!("Malformed review payload: {err}"))
                })?;
                self.service.create_review(review).await
            }
            EventType::Delete => self.service.delete_reviews(event.key).await,
        }
    }
}
