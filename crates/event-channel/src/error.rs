use thiserror::Error;

/// Errors that can occur when publishing to a channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// No consumer is registered for the named binding.
    #[error("No binding registered for '{0}'")]
    UnknownBinding(String),

    /// The binding's consumer lane has shut down.
    #[error("Binding '{0}' is closed")]
    Closed(String),

    /// The event payload could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for channel operations.
pub type Result<T> = std::result::Result<T, ChannelError>;
