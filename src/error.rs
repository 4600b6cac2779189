use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, ViewError>;

/// Errors raised by the presentation engine and its host.
#[derive(Debug, Error)]
pub enum ViewError {
    /// I/O errors while reading snapshots, thumbnails or logs.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The library snapshot could not be decoded.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// A configuration file or value is unusable.
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid path provided by the user or found in an item.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A node cache key was about to be bound a second time.
    #[error("Cache key already bound: {0}")]
    CacheKeyRebound(String),

    /// A sort registration references a field missing from a metadata entry.
    #[error("Missing sort field '{field}' for {key}")]
    MissingSortField { field: &'static str, key: String },

    /// A sort was requested before any metadata was collected.
    #[error("Metadata is empty")]
    EmptyMetadata,

    /// A sort control was disabled during setup.
    #[error("Sort '{0}' is unavailable")]
    SortUnavailable(String),

    /// An image request failed (not canceled).
    #[error("Image fetch failed: {0}")]
    ImageFetch(String),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),
}
