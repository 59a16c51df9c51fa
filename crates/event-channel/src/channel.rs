use async_trait::async_trait;

use crate::Result;
use crate::event::Event;

/// Publishes events onto a named logical channel.
///
/// `publish` returns once the transport has accepted the send. That is all
/// it promises: acceptance is not proof of persistence, and failures at the
/// consumer (duplicate keys included) are invisible to the publisher.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, binding: &str, event: Event) -> Result<()>;
}

/// Applies events to the store of one entity service.
///
/// Implemented once per entity type. CREATE inserts a new record and fails
/// with a duplicate-key error if one already exists; DELETE removes all
/// matching records, matching zero is a no-op.
#[async_trait]
pub trait EventConsumer: Send + Sync {
    async fn consume(&self, event: Event) -> common::Result<()>;
}
