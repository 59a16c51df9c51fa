/// Produces the `host/ip:port` address string each service stamps onto the
/// entities it serves.
#[derive(Debug, Clone)]
pub struct ServiceUtil {
    address: String,
}

impl ServiceUtil {
    /// Builds the address from the process hostname and the given port.
    ///
    /// Falls back to `localhost/127.0.0.1` when the hostname cannot be
    /// resolved, which is good enough for a diagnostic field.
    pub fn new(port: u16) -> Self {
        let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        Self {
            address: format!("{host}/127.0.0.1:{port}"),
        }
    }

    /// Builds a fixed address, used by tests and single-process wiring.
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    pub fn service_address(&self) -> &str {
        &self.address
    }
}
