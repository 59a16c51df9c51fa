use thiserror::Error;

/// Errors reported by the repository layer.
///
/// The services translate these into the shared error taxonomy; the
/// duplicate-key case becomes an `InvalidInput` with an identifying message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// A record already exists for the given key.
    #[error("duplicate key")]
    DuplicateKey,
}
