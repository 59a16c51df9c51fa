use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random event ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The write intent an event carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Create,
    Delete,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Create => write!(f, "CREATE"),
            EventType::Delete => write!(f, "DELETE"),
        }
    }
}

/// The envelope transported on a channel for an asynchronous write.
///
/// `key` is both the entity's root key and the channel partition key: events
/// sharing a key are delivered in publish order to a single consumer lane.
/// The payload is present for CREATE and absent for DELETE; the owning
/// consumer deserializes it into its entity type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_id: EventId,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub key: i32,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Builds a CREATE event carrying the serialized entity as payload.
    pub fn create<T: Serialize>(key: i32, payload: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event_id: EventId::new(),
            event_type: EventType::Create,
            key,
            payload: Some(serde_json::to_value(payload)?),
            timestamp: Utc::now(),
        })
    }

    /// Builds a DELETE event for everything stored under `key`.
    pub fn delete(key: i32) -> Self {
        Self {
            event_id: EventId::new(),
            event_type: EventType::Delete,
            key,
            payload: None,
            timestamp: Utc::now(),
        }
    }
}
