//! File-backed image sources.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::host::{FetchError, ImageHandle, ImageSource};
use crate::model::ItemId;

/// Extensions tried for a thumbnail, in order.
const THUMBNAIL_EXTENSIONS: &[&str] = &["jpg", "png", "webp"];

/// Serves images from a directory of `<id>_<stage>.<ext>` files.
#[derive(Debug, Clone)]
pub struct ThumbnailDir {
    root: PathBuf,
}

impl ThumbnailDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, id: &str, stage_type: u32) -> impl Iterator<Item = PathBuf> + '_ {
        let stem = format!("{}_{}", id, stage_type);
        THUMBNAIL_EXTENSIONS
            .iter()
            .map(move |ext| self.root.join(format!("{}.{}", stem, ext)))
    }
}

#[async_trait]
impl ImageSource for ThumbnailDir {
    async fn fetch_image(&self, id: &ItemId, stage_type: u32) -> Result<ImageHandle, FetchError> {
        for path in self.candidates(id, stage_type) {
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    return Ok(ImageHandle {
                        item: id.clone(),
                        stage_type,
                        location: Some(path),
                        byte_len: bytes.len(),
                    })
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(FetchError::Failed(format!("{}: {}", path.display(), e))),
            }
        }
        Err(FetchError::Failed(format!(
            "no image of type {} for {}",
            stage_type, id
        )))
    }
}

/// Source used when no artwork directory is configured: every request
/// resolves to an empty image so cards still progress through their stages.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoArtwork;

#[async_trait]
impl ImageSource for NoArtwork {
    async fn fetch_image(&self, id: &ItemId, stage_type: u32) -> Result<ImageHandle, FetchError> {
        Ok(ImageHandle {
            item: id.clone(),
            stage_type,
            location: None,
            byte_len: 0,
        })
    }
}
