pub mod channel;
pub mod error;
pub mod event;
pub mod memory;

pub use channel::{EventConsumer, EventPublisher};
pub use error::{ChannelError, Result};
pub use event::{Event, EventId, EventType};
pub use memory::InMemoryChannel;
