use async_trait::async_trait;
use thiserror::Error;

/// Failures a transport can report.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The service answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The service could not be reached at all.
    #[error("Connection failed: {0}")]
    Connect(String),
}

/// The HTTP client seam the gateway talks through.
///
/// Implementations resolve logical service URLs (`http://product/...`) to
/// whatever transport the deployment uses; the gateway only sees JSON bodies
/// and [`TransportError`]s.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<serde_json::Value, TransportError>;
}
