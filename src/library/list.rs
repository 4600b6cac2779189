//! Flat list presentation with token search.

use std::sync::Arc;

use crate::error::Result;
use crate::host::ErrorSink;
use crate::library::presentation::{Presentation, PresentationCore};
use crate::library::sort::{MetaList, SortKey, SortRegistry};
use crate::library::surface::{FlatRow, NodeId};
use crate::model::{Item, ItemId};

/// Separates the searchable terms from the item identity in a search key.
pub const SEARCH_SEPARATOR: &str = "<:>";

/// Lower-cased episode marker, or the lower-cased type when there is none.
pub fn extra_tag(item: &Item) -> Option<String> {
    item.episode()
        .or_else(|| item.media_type())
        .map(str::to_lowercase)
}

/// Lower-cased search text with any separator replaced by a space.
fn search_terms(text: &str) -> String {
    text.to_lowercase().replace(SEARCH_SEPARATOR, " ")
}

/// Search key of an item: `"<name> <tag><:><id>"`, lower-cased.
pub fn search_key(id: &str, item: &Item) -> String {
    format!(
        "{} {}{}{}",
        search_terms(&item.display_name),
        search_terms(&extra_tag(item).unwrap_or_default()),
        SEARCH_SEPARATOR,
        id
    )
}

fn query_tokens(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
struct SearchEntry {
    key: String,
    node: NodeId,
}

impl SearchEntry {
    fn terms(&self) -> &str {
        self.key
            .split(SEARCH_SEPARATOR)
            .next()
            .unwrap_or_default()
    }
}

/// Search box state. Created once and kept across renders.
#[derive(Debug, Clone, Default)]
pub struct SearchBox {
    pub query: String,
}

pub struct ListPresentation {
    core: PresentationCore,
    index: Vec<SearchEntry>,
    search: Option<SearchBox>,
    meta_list: Option<MetaList>,
    sorts: SortRegistry,
}

impl ListPresentation {
    pub fn new(errors: Arc<dyn ErrorSink>) -> Self {
        Self {
            core: PresentationCore::new(errors),
            index: Vec::new(),
            search: None,
            meta_list: None,
            sorts: SortRegistry::default(),
        }
    }

    pub fn search_box(&self) -> Option<&SearchBox> {
        self.search.as_ref()
    }

    pub fn query(&self) -> &str {
        self.search.as_ref().map(|s| s.query.as_str()).unwrap_or("")
    }

    /// Show only entries whose search terms contain every query token.
    /// Returns the number of visible entries.
    pub fn filter(&mut self, query: &str) -> usize {
        self.search.get_or_insert_with(SearchBox::default).query = query.to_string();
        self.apply_filter()
    }

    fn apply_filter(&mut self) -> usize {
        let tokens = query_tokens(self.query());
        let mut visible = 0;
        for entry in &self.index {
            let terms = entry.terms();
            let shown = tokens.iter().all(|t| terms.contains(t.as_str()));
            self.core.surface.set_hidden(entry.node, !shown);
            if shown {
                visible += 1;
            }
        }
        visible
    }

    pub fn rows(&self) -> Vec<FlatRow> {
        self.core.surface.flatten()
    }

    pub fn sorts(&self) -> &SortRegistry {
        &self.sorts
    }

    /// Reorder the list by `key`. Errors are reported as well as returned.
    pub fn sort_by(&mut self, key: SortKey) -> Result<()> {
        let list = match self.meta_list.take() {
            Some(list) => list,
            None => MetaList::from_nodes(
                &self.core.surface,
                self.index.iter().map(|e| (e.key.as_str(), e.node)),
            ),
        };
        if !self.sorts.is_prepared() {
            for err in self.sorts.prepare(&list) {
                self.core.report(&err);
            }
        }
        let result = self.sorts.apply(key, &list, &mut self.core.surface);
        self.meta_list = Some(list);
        if let Err(err) = &result {
            self.core.report(err);
        }
        result
    }
}

impl Presentation for ListPresentation {
    fn core(&self) -> &PresentationCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PresentationCore {
        &mut self.core
    }

    fn add_item_node(&mut self, id: &ItemId, item: &Arc<Item>) -> Result<Option<NodeId>> {
        let node = self
            .core
            .surface
            .create_leaf(item.clone(), item.display_name.clone());
        self.core.surface.node_mut(node).tag = extra_tag(item);
        self.index.push(SearchEntry {
            key: search_key(id, item),
            node,
        });
        Ok(Some(node))
    }

    fn pre_populate(&mut self) {
        if self.search.is_none() {
            self.search = Some(SearchBox::default());
        }
    }

    fn post_populate(&mut self) {
        self.apply_filter();
    }

    fn reset(&mut self) {
        self.index.clear();
        self.meta_list = None;
        self.sorts.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::LogSink;
    use crate::model::Library;

    fn people() -> Library {
        Library::from_items(vec![
            Item::new("1", "John Smith Live").with_meta("type", "Clip"),
            Item::new("2", "John Doe Story").with_meta("type", "Movie"),
            Item::new("3", "Pilot")
                .with_meta("type", "Show")
                .with_meta("episode", "S01E01"),
        ])
    }

    fn list() -> ListPresentation {
        ListPresentation::new(Arc::new(LogSink))
    }

    fn visible_labels(p: &ListPresentation) -> Vec<String> {
        p.rows()
            .iter()
            .map(|r| p.core().surface.node(r.node).label.clone())
            .collect()
    }

    #[test]
    fn search_key_prefers_episode_over_type() {
        let lib = people();
        assert_eq!(
            search_key("3", lib.get("3").unwrap()),
            "pilot s01e01<:>3"
        );
        assert_eq!(
            search_key("1", lib.get("1").unwrap()),
            "john smith live clip<:>1"
        );
    }

    #[test]
    fn tokens_must_all_match() {
        let mut p = list();
        p.render(&people());
        assert_eq!(p.filter("jo sm"), 1);
        assert_eq!(visible_labels(&p), vec!["John Smith Live"]);
    }

    #[test]
    fn filter_matches_tag_and_ignores_case() {
        let mut p = list();
        p.render(&people());
        assert_eq!(p.filter("MOVIE"), 1);
        assert_eq!(p.filter("s01e01 pil"), 1);
        assert_eq!(visible_labels(&p), vec!["Pilot"]);
    }

    #[test]
    fn filter_does_not_match_identity() {
        let mut p = list();
        p.render(&people());
        assert_eq!(p.filter("<:>2"), 0);
    }

    #[test]
    fn separator_in_name_keeps_the_rest_searchable() {
        let item = Item::new("7", "Live <:> Encore").with_meta("type", "Clip");
        assert_eq!(search_key("7", &item), "live   encore clip<:>7");

        let mut p = list();
        p.render(&Library::from_items(vec![item]));
        assert_eq!(p.filter("encore clip"), 1);
        assert_eq!(visible_labels(&p), vec!["Live <:> Encore"]);
    }

    #[test]
    fn empty_query_shows_everything_in_order() {
        let mut p = list();
        p.render(&people());
        p.filter("john");
        assert_eq!(p.filter("   "), 3);
        assert_eq!(
            visible_labels(&p),
            vec!["John Smith Live", "John Doe Story", "Pilot"]
        );
        assert_eq!(p.core().surface.roots().len(), 3);
    }

    #[test]
    fn query_survives_rerender() {
        let lib = people();
        let mut p = list();
        p.render(&lib);
        p.filter("doe");
        p.render(&lib);
        assert_eq!(p.query(), "doe");
        assert_eq!(visible_labels(&p), vec!["John Doe Story"]);
        assert!(p.search_box().is_some());
    }

    #[test]
    fn tags_are_shown_on_nodes() {
        let mut p = list();
        p.render(&people());
        let pilot = p.core().surface.roots()[2];
        assert_eq!(p.core().surface.node(pilot).tag.as_deref(), Some("s01e01"));
    }

    #[test]
    fn list_sorts_by_name() {
        let mut p = list();
        p.render(&people());
        p.sort_by(SortKey::Name).unwrap();
        assert_eq!(
            visible_labels(&p),
            vec!["John Doe Story", "John Smith Live", "Pilot"]
        );
    }
}
