//! Folder tree presentation: items are placed by their slash-separated path,
//! with one group node per distinct path prefix.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, ViewError};
use crate::host::ErrorSink;
use crate::library::aggregate::aggregate_groups;
use crate::library::presentation::{Presentation, PresentationCore};
use crate::library::sort::{MetaList, SortKey, SortRegistry};
use crate::library::surface::{FlatRow, NodeId};
use crate::model::{Item, ItemId};

/// Joins path segments into a cache key.
pub const KEY_SEPARATOR: &str = ":#:";

/// Split a path into its non-empty segments.
pub fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Escape backslashes and colons so a segment never contains the separator.
fn escape_segment(segment: &str) -> Cow<'_, str> {
    if !segment.contains(['\\', ':']) {
        return Cow::Borrowed(segment);
    }
    let mut escaped = String::with_capacity(segment.len() + 2);
    for c in segment.chars() {
        if c == '\\' || c == ':' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    Cow::Owned(escaped)
}

/// Cache key of the prefix ending at `segments[depth]`.
pub fn prefix_key(segments: &[&str], depth: usize) -> String {
    segments[..=depth]
        .iter()
        .map(|segment| escape_segment(segment))
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}

/// Path-prefix key to node. Keys are bound once and never rebound.
#[derive(Debug, Default)]
pub struct NodeCache {
    map: HashMap<String, NodeId>,
    order: Vec<String>,
}

impl NodeCache {
    pub fn get(&self, key: &str) -> Option<NodeId> {
        self.map.get(key).copied()
    }

    pub fn bind(&mut self, key: String, node: NodeId) -> Result<()> {
        if self.map.contains_key(&key) {
            return Err(ViewError::CacheKeyRebound(key));
        }
        self.map.insert(key.clone(), node);
        self.order.push(key);
        Ok(())
    }

    /// `(key, node)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.order.iter().map(|k| (k.as_str(), self.map[k]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }
}

/// The hierarchical presentation.
pub struct FilesPresentation {
    core: PresentationCore,
    nodes: NodeCache,
    aggregated: bool,
    meta_list: Option<MetaList>,
    sorts: SortRegistry,
    initial_sort: Option<SortKey>,
}

impl FilesPresentation {
    pub fn new(errors: Arc<dyn ErrorSink>) -> Self {
        Self {
            core: PresentationCore::new(errors),
            nodes: NodeCache::default(),
            aggregated: false,
            meta_list: None,
            sorts: SortRegistry::default(),
            initial_sort: None,
        }
    }

    /// Sort to apply once the first population finishes.
    pub fn with_initial_sort(mut self, key: Option<SortKey>) -> Self {
        self.initial_sort = key;
        self
    }

    pub fn node_cache(&self) -> &NodeCache {
        &self.nodes
    }

    pub fn sorts(&self) -> &SortRegistry {
        &self.sorts
    }

    /// Reject paths whose prefixes collide with nodes of the other kind, or
    /// whose full key is already taken.
    fn check_path(&self, segments: &[&str]) -> Result<()> {
        for depth in 0..segments.len() {
            let key = prefix_key(segments, depth);
            let Some(existing) = self.nodes.get(&key) else {
                continue;
            };
            let is_leaf_level = depth + 1 == segments.len();
            if is_leaf_level || !self.core.surface.node(existing).is_group() {
                return Err(ViewError::CacheKeyRebound(key));
            }
        }
        Ok(())
    }

    /// Place the item for `segments[depth..]` below `parent`.
    ///
    /// Returns the new top-level node, if this call created one.
    fn place(
        &mut self,
        segments: &[&str],
        depth: usize,
        parent: Option<NodeId>,
        item: &Arc<Item>,
    ) -> Result<Option<NodeId>> {
        let key = prefix_key(segments, depth);

        if depth + 1 == segments.len() {
            let leaf = self.core.surface.create_leaf(item.clone(), segments[depth]);
            self.nodes.bind(key, leaf)?;
            return Ok(match parent {
                Some(p) => {
                    self.core.surface.append(Some(p), leaf);
                    None
                }
                None => Some(leaf),
            });
        }

        let (group, created) = match self.nodes.get(&key) {
            Some(existing) => (existing, false),
            None => {
                let surface = &mut self.core.surface;
                let group = surface.create_group(segments[depth]);
                surface.set_size(group, item.size);
                surface.set_modified(group, item.modified_time);
                surface.refresh_summary(group);
                if let Some(p) = parent {
                    surface.append(Some(p), group);
                }
                self.nodes.bind(key, group)?;
                (group, true)
            }
        };

        self.place(segments, depth + 1, Some(group), item)?;
        Ok((created && parent.is_none()).then_some(group))
    }

    /// The cached meta list, generated on first use.
    fn take_meta_list(&mut self) -> MetaList {
        match self.meta_list.take() {
            Some(list) => list,
            None => MetaList::from_nodes(&self.core.surface, self.nodes.iter()),
        }
    }

    /// Reorder the tree by `key`. Errors are reported as well as returned.
    pub fn sort_by(&mut self, key: SortKey) -> Result<()> {
        let list = self.take_meta_list();
        let result = self.sorts.apply(key, &list, &mut self.core.surface);
        self.meta_list = Some(list);
        if let Err(err) = &result {
            self.core.report(err);
        }
        result
    }

    /// Visible rows in display order.
    pub fn rows(&self) -> Vec<FlatRow> {
        self.core.surface.flatten()
    }

    /// Expand or collapse a group. Leaves are ignored.
    pub fn set_expanded(&mut self, node: NodeId, expanded: bool) {
        if self.core.surface.get(node).is_some_and(|n| n.is_group()) {
            self.core.surface.set_expanded(node, expanded);
        }
    }

    /// Expand every group.
    pub fn expand_all(&mut self) {
        let groups: Vec<NodeId> = self
            .nodes
            .iter()
            .map(|(_, id)| id)
            .filter(|id| self.core.surface.node(*id).is_group())
            .collect();
        for id in groups {
            self.core.surface.set_expanded(id, true);
        }
    }
}

impl Presentation for FilesPresentation {
    fn core(&self) -> &PresentationCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PresentationCore {
        &mut self.core
    }

    fn add_item_node(&mut self, id: &ItemId, item: &Arc<Item>) -> Result<Option<NodeId>> {
        let Some(path) = item.full_path.as_deref() else {
            tracing::warn!(id = %id, "item has no path, skipped");
            return Ok(None);
        };
        let segments = path_segments(path);
        if segments.is_empty() {
            tracing::warn!(id = %id, path, "item path has no segments, skipped");
            return Ok(None);
        }
        self.check_path(&segments)?;
        self.place(&segments, 0, None, item)
    }

    fn post_populate(&mut self) {
        if !self.aggregated {
            let groups: Vec<NodeId> = self.nodes.iter().map(|(_, id)| id).collect();
            aggregate_groups(&mut self.core.surface, &groups);
            self.aggregated = true;
        }

        if !self.sorts.is_prepared() {
            let list = self.take_meta_list();
            for err in self.sorts.prepare(&list) {
                self.core.report(&err);
            }
            self.meta_list = Some(list);
            if let Some(key) = self.initial_sort.take() {
                if let Err(err) = self.sort_by(key) {
                    tracing::debug!(%err, sort = key.label(), "initial sort skipped");
                }
            }
        }
    }

    fn reset(&mut self) {
        self.nodes.clear();
        self.aggregated = false;
        self.meta_list = None;
        self.sorts.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::LogSink;
    use crate::library::presentation::Activation;
    use crate::model::Library;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collecting(Mutex<Vec<String>>);

    impl ErrorSink for Collecting {
        fn notify_error(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    fn files() -> FilesPresentation {
        FilesPresentation::new(Arc::new(LogSink))
    }

    fn file(id: &str, path: &str, size: u64, modified: f64) -> Item {
        Item::new(id, id)
            .with_path(path)
            .with_size(size)
            .with_modified(modified)
    }

    fn label(p: &FilesPresentation, id: NodeId) -> String {
        p.core().surface.node(id).label.clone()
    }

    #[test]
    fn shared_prefix_resolves_to_one_group() {
        let lib = Library::from_items(vec![
            file("x", "A/B/x.mp4", 100, 1000.0),
            file("y", "A/B/y.mp4", 250, 500.0),
        ]);
        let mut p = files();
        p.render(&lib);

        assert_eq!(p.node_cache().len(), 4);
        assert_eq!(p.core().cached().len(), 1);
        let a = p.core().cached()[0];
        assert_eq!(label(&p, a), "A");
        let b = p.node_cache().get("A:#:B").unwrap();
        assert_eq!(p.core().surface.node(a).children, vec![b]);
        assert_eq!(p.core().surface.node(b).children.len(), 2);
    }

    #[test]
    fn separator_inside_a_segment_does_not_collide() {
        let sink = Arc::new(Collecting::default());
        let mut p = FilesPresentation::new(sink.clone());
        let lib = Library::from_items(vec![
            file("1", "a/b/c.mp4", 1, 1.0),
            file("2", "a:#:b/c.mp4", 2, 2.0),
            file("3", "a\\:#:b/d.mp4", 3, 3.0),
        ]);
        p.render(&lib);

        assert!(sink.0.lock().unwrap().is_empty());
        assert_eq!(p.core().cached().len(), 3);
        assert_eq!(p.node_cache().len(), 7);
        assert_ne!(
            prefix_key(&["a", "b"], 1),
            prefix_key(&["a:#:b"], 0)
        );
        assert_eq!(prefix_key(&["A", "x.mp4"], 1), "A:#:x.mp4");
    }

    #[test]
    fn aggregates_descendant_leaves() {
        let lib = Library::from_items(vec![
            file("x", "A/B/x.mp4", 100, 1000.0),
            file("y", "A/B/y.mp4", 250, 500.0),
        ]);
        let mut p = files();
        p.render(&lib);

        for key in ["A", "A:#:B"] {
            let node = p.core().surface.node(p.node_cache().get(key).unwrap());
            assert_eq!(node.size, Some(350));
            assert_eq!(node.modified, Some(500.0));
        }
    }

    #[test]
    fn top_level_leaf_and_group_are_returned() {
        let lib = Library::from_items(vec![
            file("r", "readme.mp4", 1, 1.0),
            file("x", "Shows/x.mp4", 1, 1.0),
            file("y", "Shows/y.mp4", 1, 1.0),
        ]);
        let mut p = files();
        p.render(&lib);
        let tops: Vec<String> = p.core().cached().iter().map(|id| label(&p, *id)).collect();
        assert_eq!(tops, vec!["readme.mp4", "Shows"]);
    }

    #[test]
    fn rerender_is_idempotent() {
        let lib = Library::from_items(vec![
            file("x", "A/B/x.mp4", 100, 1000.0),
            file("y", "A/C/y.mp4", 250, 500.0),
        ]);
        let mut p = files();
        p.render(&lib);
        let nodes = p.core().surface.len();
        let roots = p.core().surface.roots().to_vec();
        p.render(&lib);
        assert_eq!(p.core().surface.len(), nodes);
        assert_eq!(p.core().surface.roots(), roots.as_slice());
        assert_eq!(p.node_cache().len(), 5);
    }

    #[test]
    fn missing_or_empty_paths_are_skipped() {
        let lib = Library::from_items(vec![
            Item::new("n", "no path"),
            file("e", "///", 1, 1.0),
            file("ok", "/Movies//ok.mp4", 1, 1.0),
        ]);
        let mut p = files();
        p.render(&lib);
        assert_eq!(p.node_cache().len(), 2);
        assert!(p.node_cache().get("Movies:#:ok.mp4").is_some());
    }

    #[test]
    fn duplicate_path_is_reported_not_rebound() {
        let sink = Arc::new(Collecting::default());
        let mut p = FilesPresentation::new(sink.clone());
        let lib = Library::from_items(vec![
            file("1", "A/x.mp4", 1, 1.0),
            file("2", "A/x.mp4", 2, 2.0),
            file("3", "A/x.mp4/inner.mp4", 3, 3.0),
        ]);
        p.render(&lib);

        assert_eq!(p.node_cache().len(), 2);
        let leaf = p.node_cache().get("A:#:x.mp4").unwrap();
        assert_eq!(p.core().surface.node(leaf).item().unwrap().id, "1");
        let errors = sink.0.lock().unwrap();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("A:#:x.mp4"));
    }

    #[test]
    fn sort_reorders_children_in_place() {
        let lib = Library::from_items(vec![
            file("b", "Dir/b.mp4", 10, 3.0),
            file("a", "Dir/A.mp4", 30, 1.0),
            file("c", "Dir/c.mp4", 20, 2.0),
        ]);
        let mut p = files();
        p.render(&lib);
        let dir = p.node_cache().get("Dir").unwrap();
        let names = |p: &FilesPresentation| -> Vec<String> {
            p.core()
                .surface
                .node(dir)
                .children
                .iter()
                .map(|id| label(p, *id))
                .collect()
        };

        p.sort_by(SortKey::Name).unwrap();
        assert_eq!(names(&p), vec!["A.mp4", "b.mp4", "c.mp4"]);
        p.sort_by(SortKey::Size).unwrap();
        assert_eq!(names(&p), vec!["A.mp4", "c.mp4", "b.mp4"]);
        p.sort_by(SortKey::ModifiedTime).unwrap();
        assert_eq!(names(&p), vec!["b.mp4", "c.mp4", "A.mp4"]);
        assert_eq!(p.core().surface.len(), 4);
    }

    #[test]
    fn sort_on_empty_library_reports_empty_metadata() {
        let sink = Arc::new(Collecting::default());
        let mut p = FilesPresentation::new(sink.clone());
        p.render(&Library::default());
        let err = p.sort_by(SortKey::Name).unwrap_err();
        assert!(matches!(err, ViewError::EmptyMetadata));
        assert_eq!(*sink.0.lock().unwrap(), vec!["Metadata is empty".to_string()]);
    }

    #[test]
    fn initial_sort_applies_after_first_render() {
        let lib = Library::from_items(vec![
            file("s", "small.mp4", 1, 1.0),
            file("l", "large.mp4", 9, 1.0),
        ]);
        let mut p = files().with_initial_sort(Some(SortKey::Size));
        p.render(&lib);
        let tops: Vec<String> = p.core().surface.roots().iter().map(|id| label(&p, *id)).collect();
        assert_eq!(tops, vec!["large.mp4", "small.mp4"]);
        assert_eq!(p.sorts().active(), Some(SortKey::Size));

        p.render(&lib);
        let tops: Vec<String> = p.core().surface.roots().iter().map(|id| label(&p, *id)).collect();
        assert_eq!(tops, vec!["large.mp4", "small.mp4"]);
    }

    #[test]
    fn failed_initial_sort_is_reported_once() {
        let sink = Arc::new(Collecting::default());
        let mut p = FilesPresentation::new(sink.clone()).with_initial_sort(Some(SortKey::Size));
        p.render(&Library::default());
        p.render(&Library::default());
        assert_eq!(p.sorts().active(), None);
        assert_eq!(*sink.0.lock().unwrap(), vec!["Metadata is empty".to_string()]);
    }

    #[test]
    fn activate_toggles_groups_and_selects_leaves() {
        let lib = Library::from_items(vec![file("x", "A/x.mp4", 1, 1.0)]);
        let mut p = files();
        p.render(&lib);
        let a = p.node_cache().get("A").unwrap();
        assert_eq!(p.rows().len(), 1);
        assert_eq!(p.activate(a), Activation::Toggled { expanded: true });
        assert_eq!(p.rows().len(), 2);
        let x = p.node_cache().get("A:#:x.mp4").unwrap();
        assert_eq!(p.activate(x), Activation::Item("x".into()));
    }

    #[test]
    fn clear_cache_rebuilds_tree() {
        let lib = Library::from_items(vec![file("x", "A/x.mp4", 5, 1.0)]);
        let mut p = files();
        p.render(&lib);
        p.clear_cache();
        assert!(p.node_cache().is_empty());
        p.render(&lib);
        assert_eq!(p.node_cache().len(), 2);
        let a = p.node_cache().get("A").unwrap();
        assert_eq!(p.core().surface.node(a).size, Some(5));
    }
}
