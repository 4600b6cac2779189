//! Contracts for the collaborators the engine calls into: error display and
//! image retrieval.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::ItemId;

/// Receives user-facing error messages.
pub trait ErrorSink: Send + Sync {
    fn notify_error(&self, message: &str);
}

/// Sink that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ErrorSink for LogSink {
    fn notify_error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// A retrieved poster image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    pub item: ItemId,
    pub stage_type: u32,
    /// Where the image came from, when it is backed by a file.
    pub location: Option<PathBuf>,
    pub byte_len: usize,
}

/// Reasons an image request did not produce an image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request was canceled before it settled.
    #[error("image loading stopped")]
    Stopped,

    #[error("{0}")]
    Failed(String),
}

/// Retrieves poster images by item id and stage type.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch_image(&self, id: &ItemId, stage_type: u32) -> Result<ImageHandle, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_display() {
        assert_eq!(FetchError::Stopped.to_string(), "image loading stopped");
        assert_eq!(
            FetchError::Failed("404 for abc".into()).to_string(),
            "404 for abc"
        );
    }
}
