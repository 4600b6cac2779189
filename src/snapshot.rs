//! Library snapshot loading.
//!
//! The listing is a JSON object keyed by item id. Document order is the
//! presentation order, so the object is decoded with a visitor instead of
//! going through an ordered-by-key map.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::error::{Result, ViewError};
use crate::model::{Item, Library};

/// Supplies the library snapshot once per session.
pub trait SnapshotSource {
    fn fetch_library_snapshot(&self) -> Result<Library>;
}

/// Item entries in document order.
struct OrderedItems(Vec<Item>);

impl<'de> Deserialize<'de> for OrderedItems {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ItemsVisitor;

        impl<'de> Visitor<'de> for ItemsVisitor {
            type Value = OrderedItems;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping item ids to item entries")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut items = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((id, mut item)) = map.next_entry::<String, Item>()? {
                    item.id = id;
                    items.push(item);
                }
                Ok(OrderedItems(items))
            }
        }

        deserializer.deserialize_map(ItemsVisitor)
    }
}

/// Decode a listing document into a [`Library`].
pub fn parse_snapshot(json: &str) -> Result<Library> {
    let OrderedItems(items) = serde_json::from_str(json)?;
    Ok(Library::from_items(items))
}

/// Snapshot stored as a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonSnapshotFile {
    path: PathBuf,
}

impl JsonSnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSource for JsonSnapshotFile {
    fn fetch_library_snapshot(&self) -> Result<Library> {
        if !self.path.is_file() {
            return Err(ViewError::InvalidPath(format!(
                "{} is not a library file",
                self.path.display()
            )));
        }
        let content = std::fs::read_to_string(&self.path)?;
        let library = parse_snapshot(&content)?;
        tracing::info!(path = %self.path.display(), items = library.len(), "library snapshot loaded");
        Ok(library)
    }
}
