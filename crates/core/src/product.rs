//! Product entity service: the root entity of the composite.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{Product, Result, ServiceError, ServiceUtil};
use event_channel::{Event, EventConsumer, EventType};
use tokio::sync::RwLock;

use crate::error::RepositoryError;

/// Storage seam for products, keyed uniquely by product id.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_product_id(&self, product_id: i32) -> Option<Product>;

    /// Inserts a new product; a second insert for the same product id fails
    /// with [`RepositoryError::DuplicateKey`] instead of overwriting.
    async fn insert(&self, product: Product) -> std::result::Result<(), RepositoryError>;

    /// Removes the product if present. Removing a missing id is a no-op.
    async fn delete_by_product_id(&self, product_id: i32);
}

/// In-memory product repository.
#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    records: Arc<RwLock<HashMap<i32, Product>>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored products.
    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_product_id(&self, product_id: i32) -> Option<Product> {
        self.records.read().await.get(&product_id).cloned()
    }

    async fn insert(&self, product: Product) -> std::result::Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        if records.contains_key(&product.product_id) {
            return Err(RepositoryError::DuplicateKey);
        }
        records.insert(product.product_id, product);
        Ok(())
    }

    async fn delete_by_product_id(&self, product_id: i32) {
        self.records.write().await.remove(&product_id);
    }
}

/// Serves product reads and applies product write events.
#[derive(Clone)]
pub struct ProductService<R> {
    repository: R,
    service_util: ServiceUtil,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R, service_util: ServiceUtil) -> Self {
        Self {
            repository,
            service_util,
        }
    }

    /// Returns the product for `product_id` with this instance's address
    /// stamped in.
    pub async fn get_product(&self, product_id: i32) -> Result<Product> {
        if product_id < 1 {
            return Err(ServiceError::invalid_input(format!(
                "Invalid productId: {product_id}"
            )));
        }
        let mut product = self
            .repository
            .find_by_product_id(product_id)
            .await
            .ok_or_else(|| {
                ServiceError::not_found(format!("No product found for productId: {product_id}"))
            })?;
        product.service_address = Some(self.service_util.service_address().to_string());
        Ok(product)
    }

    async fn create_product(&self, product: Product) -> Result<()> {
        let product_id = product.product_id;
        self.repository.insert(product).await.map_err(|_| {
            ServiceError::invalid_input(format!("Duplicate key, Product Id: {product_id}"))
        })?;
        metrics::counter!("entity_creates_total", "entity" => "product").increment(1);
        tracing::debug!(product_id, "created product entity");
        Ok(())
    }

    async fn delete_product(&self, product_id: i32) -> Result<()> {
        tracing::debug!(product_id, "deleting product entity if present");
        self.repository.delete_by_product_id(product_id).await;
        metrics::counter!("entity_deletes_total", "entity" => "product").increment(1);
        Ok(())
    }
}

/// Applies CREATE/DELETE events from the `products` binding.
#[derive(Clone)]
pub struct ProductEventConsumer<R> {
    service: ProductService<R>,
}

impl<R: ProductRepository> ProductEventConsumer<R> {
    pub fn new(service: ProductService<R>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<R: ProductRepository> EventConsumer for ProductEventConsumer<R> {
    async fn consume(&self, event: Event) -> Result<()> {
        tracing::debug!(key = event.key, event_type = %event.event_type, "processing product event");
        match event.event_type {
            EventType::Create => {
                let payload = event.payload.ok_or_else(|| {
                    ServiceError::unexpected(format!(
                        "CREATE event without payload, key: {}",
                        event.key
                    ))
                })?;
                let product: Product = serde_json::from_value(payload).map_err(|err| {
                    ServiceError::unexpected(format!("Malformed product payload: {err}"))
                })?;
                self.service.create_product(product).await
            }
            EventType::Delete => self.service.delete_product(event.key).await,
        }
    }
}
