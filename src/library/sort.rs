//! Sort keys, the per-cache metadata list, and the registry of sort controls.
//!
//! A sort never rebuilds nodes: it re-appends every cached node to its own
//! parent in the precomputed order, so each parent's children end up ordered.

use std::cmp::Ordering;

use crate::error::{Result, ViewError};
use crate::library::surface::{NodeId, Surface};

/// Field a sort control orders by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    /// Case-insensitive ascending.
    Name,
    /// Largest first.
    Size,
    /// Newest first.
    ModifiedTime,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::Name, SortKey::Size, SortKey::ModifiedTime];

    /// Parse a control name, short id or config value.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "name" | "filename" | "ab" => Some(SortKey::Name),
            "size" | "sz" => Some(SortKey::Size),
            "modified" | "md" | "modifiedTime" => Some(SortKey::ModifiedTime),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Name => "filename",
            SortKey::Size => "size",
            SortKey::ModifiedTime => "modified",
        }
    }

    /// Short control id shown on the sort buttons.
    pub fn short_id(&self) -> &'static str {
        match self {
            SortKey::Name => "ab",
            SortKey::Size => "sz",
            SortKey::ModifiedTime => "md",
        }
    }

    /// Metadata field the key reads.
    pub fn field(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Size => "size",
            SortKey::ModifiedTime => "modifiedTime",
        }
    }

    fn has_field(&self, entry: &MetaListEntry) -> bool {
        match self {
            SortKey::Name => entry.name.is_some(),
            SortKey::Size => entry.size.is_some(),
            SortKey::ModifiedTime => entry.modified_time.is_some(),
        }
    }

    /// Total order over entries. Entries must carry the key's field.
    pub fn compare(&self, a: &MetaListEntry, b: &MetaListEntry) -> Ordering {
        match self {
            SortKey::Name => {
                let (a, b) = (a.name.as_deref().unwrap_or(""), b.name.as_deref().unwrap_or(""));
                a.to_lowercase()
                    .cmp(&b.to_lowercase())
                    .then_with(|| a.cmp(b))
            }
            SortKey::Size => b.size.cmp(&a.size),
            SortKey::ModifiedTime => b
                .modified_time
                .unwrap_or(f64::MIN)
                .total_cmp(&a.modified_time.unwrap_or(f64::MIN)),
        }
    }
}

/// Sort-only snapshot of one cached node.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaListEntry {
    pub key: String,
    pub node: NodeId,
    pub name: Option<String>,
    pub size: Option<u64>,
    pub modified_time: Option<f64>,
}

/// Metadata of every cached node, in cache order.
#[derive(Debug, Clone, Default)]
pub struct MetaList {
    entries: Vec<MetaListEntry>,
}

impl MetaList {
    pub fn new(entries: Vec<MetaListEntry>) -> Self {
        Self { entries }
    }

    /// Snapshot `(key, node)` pairs from the surface.
    pub fn from_nodes<'a>(
        surface: &Surface,
        keyed: impl IntoIterator<Item = (&'a str, NodeId)>,
    ) -> Self {
        let entries = keyed
            .into_iter()
            .filter_map(|(key, id)| {
                let node = surface.get(id)?;
                Some(MetaListEntry {
                    key: key.to_string(),
                    node: id,
                    name: Some(node.label.clone()),
                    size: node.size,
                    modified_time: node.modified,
                })
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[MetaListEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
enum ControlState {
    Ready,
    Disabled(String),
}

/// One sort button.
#[derive(Debug, Clone)]
pub struct SortControl {
    key: SortKey,
    state: ControlState,
    order: Option<Vec<NodeId>>,
}

impl SortControl {
    pub fn key(&self) -> SortKey {
        self.key
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.state, ControlState::Ready)
    }
}

/// Registered sort controls for one presentation.
#[derive(Debug, Clone)]
pub struct SortRegistry {
    controls: Vec<SortControl>,
    prepared: bool,
    active: Option<SortKey>,
}

impl Default for SortRegistry {
    fn default() -> Self {
        Self::new(&SortKey::ALL)
    }
}

impl SortRegistry {
    pub fn new(keys: &[SortKey]) -> Self {
        Self {
            controls: keys
                .iter()
                .map(|&key| SortControl {
                    key,
                    state: ControlState::Ready,
                    order: None,
                })
                .collect(),
            prepared: false,
            active: None,
        }
    }

    pub fn controls(&self) -> &[SortControl] {
        &self.controls
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Key of the last applied sort.
    pub fn active(&self) -> Option<SortKey> {
        self.active
    }

    /// Validate every control against `list`. A control whose field is missing
    /// from any entry is disabled; the errors are returned for reporting.
    pub fn prepare(&mut self, list: &MetaList) -> Vec<ViewError> {
        let mut errors = Vec::new();
        for control in &mut self.controls {
            let missing = list
                .entries()
                .iter()
                .find(|entry| !control.key.has_field(entry));
            control.state = match missing {
                Some(entry) => {
                    let err = ViewError::MissingSortField {
                        field: control.key.field(),
                        key: entry.key.clone(),
                    };
                    let reason = err.to_string();
                    errors.push(err);
                    ControlState::Disabled(reason)
                }
                None => ControlState::Ready,
            };
            control.order = None;
        }
        self.prepared = true;
        errors
    }

    /// Reorder the surface by `key`. The order is computed on first use and
    /// reused afterwards.
    pub fn apply(&mut self, key: SortKey, list: &MetaList, surface: &mut Surface) -> Result<()> {
        if list.is_empty() {
            return Err(ViewError::EmptyMetadata);
        }
        let control = self
            .controls
            .iter_mut()
            .find(|c| c.key == key)
            .ok_or_else(|| ViewError::SortUnavailable(key.label().to_string()))?;
        if let ControlState::Disabled(reason) = &control.state {
            return Err(ViewError::SortUnavailable(format!("{} ({})", key.label(), reason)));
        }

        let order = control.order.get_or_insert_with(|| {
            let mut entries: Vec<&MetaListEntry> = list.entries().iter().collect();
            entries.sort_by(|a, b| key.compare(a, b));
            entries.into_iter().map(|e| e.node).collect()
        });

        surface.suspend_layout();
        for &node in order.iter() {
            if surface.get(node).is_some() {
                surface.reappend(node);
            }
        }
        surface.resume_layout();

        self.active = Some(key);
        tracing::debug!(sort = key.label(), nodes = list.len(), "sort applied");
        Ok(())
    }

    /// Forget computed orders and validation; used when the cache is cleared.
    pub fn invalidate(&mut self) {
        for control in &mut self.controls {
            control.state = ControlState::Ready;
            control.order = None;
        }
        self.prepared = false;
        self.active = None;
    }
}
