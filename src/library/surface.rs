//! Rendering surface: an arena of nodes arranged under a canvas.
//!
//! Nodes are created detached and attached with [`Surface::append`], which
//! moves a node that already has a parent (the same way re-appending an
//! element moves it). Sorting and cached re-renders rely on that.
//!
//! Group nodes carry `size`/`modified` attributes and a rendered summary.
//! Attribute writes can be observed through a change channel: while it is
//! connected, writes to observed nodes queue [`ChangeRecord`]s that are
//! delivered to the summary refresh when the channel is disconnected.

use std::collections::HashSet;
use std::sync::Arc;

use crate::library::format::{format_mod_time, format_size};
use crate::model::Item;

/// Handle to a node in a [`Surface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Rendered element for exactly one item.
    Leaf(Arc<Item>),
    /// Shared path prefix (folder).
    Group,
}

/// Rendered text of a group's aggregate attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub size: String,
    pub modified: String,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub label: String,
    /// Short badge shown next to the label (type or episode marker).
    pub tag: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub size: Option<u64>,
    pub modified: Option<f64>,
    pub summary: Option<Summary>,
    pub hidden: bool,
    pub expanded: bool,
    attached: bool,
}

impl Node {
    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group)
    }

    pub fn item(&self) -> Option<&Arc<Item>> {
        match &self.kind {
            NodeKind::Leaf(item) => Some(item),
            NodeKind::Group => None,
        }
    }
}

/// Observed attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attr {
    Size,
    Modified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRecord {
    pub node: NodeId,
    pub attr: Attr,
}

/// A visible row of the surface in display order.
#[derive(Debug, Clone)]
pub struct FlatRow {
    pub node: NodeId,
    pub depth: usize,
    pub is_last_sibling: bool,
}

#[derive(Debug, Default)]
struct ChangeChannel {
    observed: HashSet<NodeId>,
    records: Vec<ChangeRecord>,
    connected: bool,
}

#[derive(Debug, Default)]
pub struct Surface {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    channel: ChangeChannel,
    suspended: usize,
    layout_dirty: bool,
    layout_passes: usize,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    fn create(&mut self, kind: NodeKind, label: String) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            label,
            tag: None,
            parent: None,
            children: Vec::new(),
            size: None,
            modified: None,
            summary: None,
            hidden: false,
            expanded: false,
            attached: false,
        });
        id
    }

    /// Create a detached leaf for `item`, seeded with its size and modified time.
    pub fn create_leaf(&mut self, item: Arc<Item>, label: impl Into<String>) -> NodeId {
        let (size, modified) = (item.size, item.modified_time);
        let id = self.create(NodeKind::Leaf(item), label.into());
        let node = &mut self.nodes[id.0];
        node.size = Some(size);
        node.modified = Some(modified);
        id
    }

    /// Create a detached, collapsed group.
    pub fn create_group(&mut self, label: impl Into<String>) -> NodeId {
        self.create(NodeKind::Group, label.into())
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level nodes currently on the canvas, in display order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    fn detach(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0];
        if !node.attached {
            return;
        }
        node.attached = false;
        match node.parent.take() {
            Some(parent) => self.nodes[parent.0].children.retain(|c| *c != id),
            None => self.roots.retain(|c| *c != id),
        }
    }

    /// Append `child` as the last child of `parent`, or of the canvas when
    /// `parent` is `None`. A node that is already attached is moved.
    pub fn append(&mut self, parent: Option<NodeId>, child: NodeId) {
        self.detach(child);
        match parent {
            Some(p) => self.nodes[p.0].children.push(child),
            None => self.roots.push(child),
        }
        let node = &mut self.nodes[child.0];
        node.parent = parent;
        node.attached = true;
        self.touch_layout();
    }

    /// Move an attached node to the end of its current parent.
    pub fn reappend(&mut self, id: NodeId) {
        let parent = self.nodes[id.0].parent;
        self.append(parent, id);
    }

    /// Remove every node from the canvas. Subtrees stay intact.
    pub fn clear_canvas(&mut self) {
        for id in std::mem::take(&mut self.roots) {
            self.nodes[id.0].attached = false;
        }
        self.touch_layout();
    }

    /// Drop every node. Outstanding [`NodeId`]s become invalid.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.channel = ChangeChannel::default();
        self.touch_layout();
    }

    // ── Layout batching ─────────────────────────────────────────────────────

    /// Defer layout until the matching [`Surface::resume_layout`].
    pub fn suspend_layout(&mut self) {
        self.suspended += 1;
    }

    pub fn resume_layout(&mut self) {
        self.suspended = self.suspended.saturating_sub(1);
        if self.suspended == 0 && self.layout_dirty {
            self.layout_dirty = false;
            self.layout_passes += 1;
        }
    }

    fn touch_layout(&mut self) {
        if self.suspended > 0 {
            self.layout_dirty = true;
        } else {
            self.layout_passes += 1;
        }
    }

    /// Number of layout updates performed so far.
    pub fn layout_passes(&self) -> usize {
        self.layout_passes
    }

    // ── Attributes & change channel ─────────────────────────────────────────

    /// Start recording attribute writes on `nodes`.
    pub fn connect(&mut self, nodes: impl IntoIterator<Item = NodeId>) {
        self.channel.observed.extend(nodes);
        self.channel.connected = true;
    }

    /// Records queued but not yet delivered.
    pub fn pending_records(&self) -> &[ChangeRecord] {
        &self.channel.records
    }

    /// Stop observing, delivering every queued record first.
    ///
    /// Returns the number of records delivered.
    pub fn disconnect(&mut self) -> usize {
        let records = std::mem::take(&mut self.channel.records);
        self.channel.observed.clear();
        self.channel.connected = false;
        for record in &records {
            self.refresh_summary(record.node);
        }
        records.len()
    }

    pub fn set_size(&mut self, id: NodeId, size: u64) {
        self.nodes[id.0].size = Some(size);
        self.record(id, Attr::Size);
    }

    pub fn set_modified(&mut self, id: NodeId, modified: f64) {
        self.nodes[id.0].modified = Some(modified);
        self.record(id, Attr::Modified);
    }

    fn record(&mut self, node: NodeId, attr: Attr) {
        if self.channel.connected && self.channel.observed.contains(&node) {
            self.channel.records.push(ChangeRecord { node, attr });
        }
    }

    /// Re-render the summary text of a node from its attributes.
    pub fn refresh_summary(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0];
        node.summary = Some(Summary {
            size: node.size.map(format_size).unwrap_or_default(),
            modified: node.modified.map(format_mod_time).unwrap_or_default(),
        });
    }

    // ── Visibility ──────────────────────────────────────────────────────────

    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        self.nodes[id.0].hidden = hidden;
    }

    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) {
        self.nodes[id.0].expanded = expanded;
    }

    /// Walk the canvas in display order, skipping hidden nodes and the
    /// children of collapsed groups.
    pub fn flatten(&self) -> Vec<FlatRow> {
        let mut rows = Vec::new();
        self.flatten_level(&self.roots, 0, &mut rows);
        rows
    }

    fn flatten_level(&self, level: &[NodeId], depth: usize, rows: &mut Vec<FlatRow>) {
        let visible: Vec<NodeId> = level
            .iter()
            .copied()
            .filter(|id| !self.nodes[id.0].hidden)
            .collect();
        for (i, id) in visible.iter().enumerate() {
            rows.push(FlatRow {
                node: *id,
                depth,
                is_last_sibling: i == visible.len() - 1,
            });
            let node = &self.nodes[id.0];
            if node.expanded && !node.children.is_empty() {
                self.flatten_level(&node.children, depth + 1, rows);
            }
        }
    }

    /// Leaves below `id`, depth first.
    pub fn descendant_leaves(&self, id: NodeId) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current.0];
            if node.is_group() {
                stack.extend(node.children.iter().rev().copied());
            } else if current != id {
                leaves.push(current);
            }
        }
        leaves
    }
}
