use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};

use crate::channel::{EventConsumer, EventPublisher};
use crate::error::ChannelError;
use crate::event::Event;

struct Binding {
    consumer: Arc<dyn EventConsumer>,
    lanes: Mutex<HashMap<i32, mpsc::UnboundedSender<Event>>>,
}

struct ChannelInner {
    bindings: RwLock<HashMap<String, Arc<Binding>>>,
    pending: AtomicUsize,
    drained: Notify,
}

/// In-memory channel implementation with per-key ordered delivery.
///
/// Each binding owns one worker task per partition key; events for a key are
/// consumed strictly in publish order while distinct keys proceed
/// concurrently. Consumer failures are logged and counted but never surfaced
/// to the publisher, matching the fire-and-forget publish contract.
///
/// Lanes live as long as the channel: the worker task and sender for a key
/// stay resident after its last event, so per-binding memory grows with the
/// number of distinct keys ever published, not with the current backlog.
#[derive(Clone)]
pub struct InMemoryChannel {
    inner: Arc<ChannelInner>,
}

impl Default for InMemoryChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryChannel {
    /// Creates a channel with no bindings.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                bindings: RwLock::new(HashMap::new()),
                pending: AtomicUsize::new(0),
                drained: Notify::new(),
            }),
        }
    }

    /// Registers the consumer for a binding, replacing any previous one.
    ///
    /// Lanes already spawned keep their old consumer; register bindings
    /// before publishing.
    pub fn register(&self, binding: impl Into<String>, consumer: Arc<dyn EventConsumer>) {
        let binding = binding.into();
        self.inner.bindings.write().unwrap().insert(
            binding,
            Arc::new(Binding {
                consumer,
                lanes: Mutex::new(HashMap::new()),
            }),
        );
    }

    /// Number of events accepted but not yet consumed.
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::SeqCst)
    }

    /// Waits until every accepted event has been consumed.
    pub async fn quiesce(&self) {
        loop {
            let notified = self.inner.drained.notified();
            if self.inner.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    fn lane_sender(
        &self,
        binding_name: &str,
        binding: &Arc<Binding>,
        key: i32,
    ) -> mpsc::UnboundedSender<Event> {
        let mut lanes = binding.lanes.lock().unwrap();
        lanes
            .entry(key)
            .or_insert_with(|| {
                let (tx, rx) = mpsc::unbounded_channel();
                tokio::spawn(run_lane(
                    binding_name.to_string(),
                    key,
                    binding.consumer.clone(),
                    rx,
                    self.inner.clone(),
                ));
                tx
            })
            .clone()
    }
}

async fn run_lane(
    binding: String,
    key: i32,
    consumer: Arc<dyn EventConsumer>,
    mut rx: mpsc::UnboundedReceiver<Event>,
    inner: Arc<ChannelInner>,
) {
    while let Some(event) = rx.recv().await {
        let event_type = event.event_type;
        match consumer.consume(event).await {
            Ok(()) => {
                metrics::counter!("events_consumed_total").increment(1);
            }
            Err(err) => {
                // The publisher already returned; this is only observable here.
                metrics::counter!("events_failed_total").increment(1);
                tracing::error!(%binding, key, %event_type, error = %err, "event consumption failed");
            }
        }
        if inner.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            inner.drained.notify_waiters();
        }
    }
}

#[async_trait]
impl EventPublisher for InMemoryChannel {
    async fn publish(&self, binding: &str, event: Event) -> crate::Result<()> {
        let target = self
            .inner
            .bindings
            .read()
            .unwrap()
            .get(binding)
            .cloned()
            .ok_or_else(|| ChannelError::UnknownBinding(binding.to_string()))?;

        tracing::debug!(%binding, key = event.key, event_type = %event.event_type, "publishing event");
        let tx = self.lane_sender(binding, &target, event.key);
        self.inner.pending.fetch_add(1, Ordering::SeqCst);
        if tx.send(event).is_err() {
            if self.inner.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
                self.inner.drained.notify_waiters();
            }
            return Err(ChannelError::Closed(binding.to_string()));
        }
        metrics::counter!("events_published_total").increment(1);
        Ok(())
    }
}
