//! Library data model: items, their open metadata mapping, and the ordered
//! snapshot handed to presentations.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

/// Opaque, unique item identifier (the snapshot key).
pub type ItemId = String;

/// A single scalar metadata value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl MetaValue {
    /// String payload, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Bool(b) => write!(f, "{}", b),
            MetaValue::Integer(i) => write!(f, "{}", i),
            MetaValue::Float(v) => write!(f, "{}", v),
            MetaValue::Text(s) => f.write_str(s),
        }
    }
}

/// Open key to scalar mapping attached to every item.
///
/// `null` values in the source document are dropped on load, so presence of a
/// key always means a usable value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "BTreeMap<String, Option<MetaValue>>")]
pub struct Metadata(BTreeMap<String, MetaValue>);

impl From<BTreeMap<String, Option<MetaValue>>> for Metadata {
    fn from(raw: BTreeMap<String, Option<MetaValue>>) -> Self {
        Metadata(
            raw.into_iter()
                .filter_map(|(k, v)| v.map(|v| (k, v)))
                .collect(),
        )
    }
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: MetaValue) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.0.get(key)
    }

    /// Non-empty text value for `key`.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(MetaValue::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, MetaValue)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, MetaValue)>>(iter: I) -> Self {
        Metadata(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// One media entry of the library snapshot. Read-only for the engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Item {
    /// Filled from the snapshot key, not from the entry body.
    #[serde(skip)]
    pub id: ItemId,
    #[serde(rename = "name", default)]
    pub display_name: String,
    #[serde(default)]
    pub actual_name: Option<String>,
    #[serde(rename = "fullpath", default)]
    pub full_path: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "modified_date", default)]
    pub modified_time: f64,
    #[serde(rename = "creation_date", default)]
    pub creation_time: Option<f64>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            actual_name: None,
            full_path: None,
            size: 0,
            modified_time: 0.0,
            creation_time: None,
            metadata: Metadata::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.full_path = Some(path.into());
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn with_modified(mut self, modified_time: f64) -> Self {
        self.modified_time = modified_time;
        self
    }

    pub fn with_meta(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key, MetaValue::Text(value.to_string()));
        self
    }

    /// Episode marker such as `S01E02`.
    pub fn episode(&self) -> Option<&str> {
        self.metadata.text("episode")
    }

    /// Media type: `Clip`, `Show` or `Movie`.
    pub fn media_type(&self) -> Option<&str> {
        self.metadata.text("type")
    }

    /// Show name used to group episodes.
    pub fn show(&self) -> Option<&str> {
        self.metadata.text("show")
    }
}

/// Ordered, immutable snapshot of the library.
///
/// Iteration follows the order in which items were supplied.
#[derive(Debug, Clone, Default)]
pub struct Library {
    items: Vec<Arc<Item>>,
    index: HashMap<ItemId, usize>,
}

impl Library {
    /// Build a library from `items`. A repeated id keeps its first entry.
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let mut library = Library::default();
        for item in items {
            if library.index.contains_key(&item.id) {
                tracing::warn!(id = %item.id, "duplicate item id in snapshot, keeping first");
                continue;
            }
            library.index.insert(item.id.clone(), library.items.len());
            library.items.push(Arc::new(item));
        }
        library
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Item>> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Item>> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
