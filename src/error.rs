use crate::store::StoreError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the document pipeline and the capped log device.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Caller misconfiguration: a key route runs through a non-mapping
    /// value, an invalid datetime pattern, a bad device config, etc.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The assembled document could not be encoded as JSON.
    #[error("failed to encode log document: {0}")]
    Encoding(#[source] serde_json::Error),

    /// A stored document could not be turned back into a record.
    #[error("failed to decode log document: {0}")]
    Decode(String),

    /// The backing capped list store rejected the operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}
