//! The rendering contract shared by every presentation strategy.

use std::sync::Arc;

use crate::error::ViewError;
use crate::host::{ErrorSink, LogSink};
use crate::library::episodes::Season;
use crate::library::surface::{NodeId, Surface};
use crate::model::{Item, ItemId, Library};

/// Selection callback registered with [`Presentation::on_activate`].
pub type ActivateCallback = Box<dyn FnMut(&ItemId, &Item) + Send>;

/// Result of activating a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    /// An item was selected and the callback ran.
    Item(ItemId),
    /// A group was expanded or collapsed.
    Toggled { expanded: bool },
    /// A series card opened its season listing.
    Series { show: String, seasons: Vec<Season> },
    None,
}

/// State every presentation owns: the surface, the top-level node cache,
/// the selection callback and the error sink.
pub struct PresentationCore {
    pub surface: Surface,
    cache: Vec<NodeId>,
    on_activate: ActivateCallback,
    errors: Arc<dyn ErrorSink>,
}

impl Default for PresentationCore {
    fn default() -> Self {
        Self::new(Arc::new(LogSink))
    }
}

impl PresentationCore {
    pub fn new(errors: Arc<dyn ErrorSink>) -> Self {
        Self {
            surface: Surface::new(),
            cache: Vec::new(),
            on_activate: Box::new(|_, _| {}),
            errors,
        }
    }

    /// Cached top-level nodes in their last known order.
    pub fn cached(&self) -> &[NodeId] {
        &self.cache
    }

    pub fn error_sink(&self) -> &Arc<dyn ErrorSink> {
        &self.errors
    }

    pub fn set_error_sink(&mut self, errors: Arc<dyn ErrorSink>) {
        self.errors = errors;
    }

    /// Surface an error to the user and the log.
    pub fn report(&self, err: &ViewError) {
        match err {
            ViewError::CacheKeyRebound(_) => tracing::error!(error = %err, "node cache invariant violated"),
            _ => tracing::warn!(error = %err, "presentation error"),
        }
        self.errors.notify_error(&err.to_string());
    }

    /// Run the selection callback for a leaf node.
    pub fn activate_leaf(&mut self, node: NodeId) -> Activation {
        let Some(item) = self.surface.get(node).and_then(|n| n.item()).cloned() else {
            return Activation::None;
        };
        self.activate_item(&item)
    }

    /// Run the selection callback for an item that has no node of its own.
    pub fn activate_item(&mut self, item: &Item) -> Activation {
        (self.on_activate)(&item.id, item);
        Activation::Item(item.id.clone())
    }

    /// Keep the cache in the order the canvas currently shows, so a sort
    /// survives the next cached render.
    fn remember_canvas_order(&mut self) {
        let roots = self.surface.roots();
        if !roots.is_empty() && roots.len() == self.cache.len() {
            self.cache = roots.to_vec();
        }
    }

    fn clear(&mut self) {
        self.surface.clear();
        self.cache.clear();
    }
}

/// A presentation strategy over a library snapshot.
///
/// Implementors provide node generation and the populate hooks; rendering,
/// caching and activation are shared.
pub trait Presentation {
    fn core(&self) -> &PresentationCore;
    fn core_mut(&mut self) -> &mut PresentationCore;

    /// Generate the node for one item. `Ok(None)` means the item was absorbed
    /// into an existing structure and there is no new top-level node.
    fn add_item_node(&mut self, id: &ItemId, item: &Arc<Item>) -> crate::Result<Option<NodeId>>;

    /// Runs before nodes are placed on the canvas, on every render.
    fn pre_populate(&mut self) {}

    /// Runs after nodes are placed on the canvas, on every render.
    fn post_populate(&mut self) {}

    /// Drop strategy-specific derived state. Called by [`Presentation::clear_cache`].
    fn reset(&mut self) {}

    /// Populate the canvas from `library`.
    ///
    /// With a warm cache the cached nodes are re-appended without generating
    /// anything; otherwise every item goes through `add_item_node` once.
    /// Failures are reported per item and do not stop the pass.
    fn render(&mut self, library: &Library) {
        {
            let core = self.core_mut();
            core.surface.suspend_layout();
            core.remember_canvas_order();
            core.surface.clear_canvas();
        }
        self.pre_populate();

        if self.core().cache.is_empty() {
            for item in library.iter() {
                match self.add_item_node(&item.id, item) {
                    Ok(Some(node)) => self.core_mut().cache.push(node),
                    Ok(None) => {}
                    Err(err) => self.core().report(&err),
                }
            }
            tracing::debug!(
                items = library.len(),
                top_level = self.core().cache.len(),
                "presentation populated"
            );
        }

        {
            let core = self.core_mut();
            for node in core.cache.clone() {
                core.surface.append(None, node);
            }
        }

        self.post_populate();
        self.core_mut().surface.resume_layout();
    }

    /// Register the item selection callback, replacing any previous one.
    fn on_activate(&mut self, callback: ActivateCallback) {
        self.core_mut().on_activate = callback;
    }

    /// Activate a node: leaves run the selection callback, groups toggle.
    fn activate(&mut self, node: NodeId) -> Activation {
        let core = self.core_mut();
        let Some(target) = core.surface.get(node) else {
            return Activation::None;
        };
        if target.is_group() {
            let expanded = !target.expanded;
            core.surface.set_expanded(node, expanded);
            return Activation::Toggled { expanded };
        }
        core.activate_leaf(node)
    }

    /// Drop every generated node so the next render starts from scratch.
    fn clear_cache(&mut self) {
        self.core_mut().clear();
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Minimal flat strategy that counts generator calls.
    #[derive(Default)]
    struct Flat {
        core: PresentationCore,
        generated: usize,
        hooks: Vec<&'static str>,
    }

    impl Presentation for Flat {
        fn core(&self) -> &PresentationCore {
            &self.core
        }
        fn core_mut(&mut self) -> &mut PresentationCore {
            &mut self.core
        }
        fn add_item_node(&mut self, _id: &ItemId, item: &Arc<Item>) -> crate::Result<Option<NodeId>> {
            self.generated += 1;
            if item.display_name.is_empty() {
                return Err(ViewError::InvalidPath("unnamed".into()));
            }
            if item.display_name == "absorbed" {
                return Ok(None);
            }
            Ok(Some(self.core.surface.create_leaf(item.clone(), &item.display_name)))
        }
        fn pre_populate(&mut self) {
            self.hooks.push("pre");
        }
        fn post_populate(&mut self) {
            self.hooks.push("post");
        }
    }

    #[derive(Default)]
    struct Collecting(Mutex<Vec<String>>);

    impl ErrorSink for Collecting {
        fn notify_error(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    fn library() -> Library {
        Library::from_items(vec![
            Item::new("1", "one"),
            Item::new("2", "absorbed"),
            Item::new("3", "three"),
        ])
    }

    #[test]
    fn render_generates_once_and_reuses_cache() {
        let lib = library();
        let mut p = Flat::default();
        p.render(&lib);
        assert_eq!(p.generated, 3);
        assert_eq!(p.core().cached().len(), 2);
        let first: Vec<NodeId> = p.core().surface.roots().to_vec();

        p.render(&lib);
        assert_eq!(p.generated, 3);
        assert_eq!(p.core().surface.roots(), first.as_slice());
        assert_eq!(p.core().surface.len(), 2);
    }

    #[test]
    fn hooks_run_on_cache_hit_and_miss() {
        let lib = library();
        let mut p = Flat::default();
        p.render(&lib);
        p.render(&lib);
        assert_eq!(p.hooks, vec!["pre", "post", "pre", "post"]);
    }

    #[test]
    fn render_is_one_layout_pass() {
        let lib = library();
        let mut p = Flat::default();
        let before = p.core().surface.layout_passes();
        p.render(&lib);
        assert_eq!(p.core().surface.layout_passes(), before + 1);
    }

    #[test]
    fn item_errors_are_reported_and_skipped() {
        let sink = Arc::new(Collecting::default());
        let mut p = Flat::default();
        p.core_mut().set_error_sink(sink.clone());
        let lib = Library::from_items(vec![Item::new("1", ""), Item::new("2", "ok")]);
        p.render(&lib);
        assert_eq!(p.core().cached().len(), 1);
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn activate_runs_registered_callback() {
        let lib = library();
        let mut p = Flat::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        p.on_activate(Box::new(move |id, item| {
            sink.lock().unwrap().push(format!("{}:{}", id, item.display_name));
        }));
        p.render(&lib);
        let node = p.core().surface.roots()[1];
        assert_eq!(p.activate(node), Activation::Item("3".into()));
        assert_eq!(*seen.lock().unwrap(), vec!["3:three".to_string()]);
    }

    #[test]
    fn default_callback_is_noop() {
        let lib = library();
        let mut p = Flat::default();
        p.render(&lib);
        let node = p.core().surface.roots()[0];
        assert_eq!(p.activate(node), Activation::Item("1".into()));
    }

    #[test]
    fn clear_cache_regenerates_on_next_render() {
        let lib = library();
        let mut p = Flat::default();
        p.render(&lib);
        p.clear_cache();
        assert!(p.core().cached().is_empty());
        p.render(&lib);
        assert_eq!(p.generated, 6);
        assert_eq!(p.core().surface.roots().len(), 2);
    }

    #[test]
    fn cached_render_keeps_canvas_order() {
        let lib = library();
        let mut p = Flat::default();
        p.render(&lib);
        let first = p.core().surface.roots()[0];
        p.core_mut().surface.reappend(first);
        let reordered = p.core().surface.roots().to_vec();
        p.render(&lib);
        assert_eq!(p.core().surface.roots(), reordered.as_slice());
    }
}
