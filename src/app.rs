use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use medialib_view::host::{ErrorSink, FetchError, ImageHandle};
use medialib_view::library::episodes::{Episode, Season};
use medialib_view::library::presentation::{ActivateCallback, Activation, Presentation};
use medialib_view::library::scheduler::{Completion, ImageRequest, RequestKey};
use medialib_view::library::surface::{NodeId, Surface};
use medialib_view::library::{
    FilesPresentation, ListPresentation, PosterConfig, PosterPresentation, SortKey,
};
use medialib_view::model::Library;
use medialib_view::ViewError;

/// Seconds a status message stays on screen.
const STATUS_TIMEOUT_SECS: u64 = 3;

/// Which presentation is on screen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    List,
    #[default]
    Files,
    Poster,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::List, ViewMode::Files, ViewMode::Poster];

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::List => "List",
            ViewMode::Files => "Files",
            ViewMode::Poster => "Poster",
        }
    }

    fn index(self) -> usize {
        match self {
            ViewMode::List => 0,
            ViewMode::Files => 1,
            ViewMode::Poster => 2,
        }
    }
}

impl FromStr for ViewMode {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "list" => Ok(ViewMode::List),
            "files" | "tree" => Ok(ViewMode::Files),
            "poster" | "grid" => Ok(ViewMode::Poster),
            other => Err(ViewError::Config(format!(
                "unknown view '{}' (expected list, files or poster)",
                other
            ))),
        }
    }
}

/// Cursor and scroll position of one view.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub index: usize,
    pub scroll: usize,
}

impl Selection {
    fn clamp(&mut self, len: usize) {
        if len == 0 {
            *self = Selection::default();
        } else if self.index >= len {
            self.index = len - 1;
        }
    }

    /// Keep the selected row within `visible_height` rows of the scroll offset.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.index < self.scroll {
            self.scroll = self.index;
        } else if self.index >= self.scroll + visible_height {
            self.scroll = self.index + 1 - visible_height;
        }
    }
}

/// Season listing opened from a series card.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodesState {
    pub show: String,
    pub seasons: Vec<Season>,
    /// Index into the episodes of all seasons, in listing order.
    pub selected: usize,
}

impl EpisodesState {
    pub fn episode_count(&self) -> usize {
        self.seasons.iter().map(|s| s.episodes.len()).sum()
    }

    pub fn selected_episode(&self) -> Option<(&Season, &Episode)> {
        self.seasons
            .iter()
            .flat_map(|season| season.episodes.iter().map(move |e| (season, e)))
            .nth(self.selected)
    }
}

/// Application mode.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum AppMode {
    #[default]
    Normal,
    /// Editing the list view query.
    Search,
    Episodes(EpisodesState),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub created: Instant,
}

/// Main application state.
pub struct App {
    pub library: Library,
    pub view: ViewMode,
    pub list: ListPresentation,
    pub files: FilesPresentation,
    pub poster: PosterPresentation,
    selections: [Selection; 3],
    pub mode: AppMode,
    pub search_input: String,
    /// Cards per poster grid row, set by the renderer.
    pub poster_columns: usize,
    pub status_message: Option<StatusMessage>,
    pub last_activated: Option<String>,
    pub should_quit: bool,
}

impl App {
    /// Build the three presentations and render the initial view.
    ///
    /// `activate` produces the selection callback registered with each
    /// presentation.
    pub fn new(
        library: Library,
        errors: Arc<dyn ErrorSink>,
        poster_config: PosterConfig,
        initial_sort: Option<SortKey>,
        view: ViewMode,
        activate: impl Fn() -> ActivateCallback,
    ) -> Self {
        let mut list = ListPresentation::new(errors.clone());
        let mut files = FilesPresentation::new(errors.clone()).with_initial_sort(initial_sort);
        let mut poster = PosterPresentation::new(errors, poster_config);
        list.on_activate(activate());
        files.on_activate(activate());
        poster.on_activate(activate());

        let mut app = Self {
            library,
            view,
            list,
            files,
            poster,
            selections: [Selection::default(); 3],
            mode: AppMode::Normal,
            search_input: String::new(),
            poster_columns: 1,
            status_message: None,
            last_activated: None,
            should_quit: false,
        };
        app.render_current();
        app
    }

    /// Render the current view from the library snapshot.
    pub fn render_current(&mut self) {
        match self.view {
            ViewMode::List => self.list.render(&self.library),
            ViewMode::Files => self.files.render(&self.library),
            ViewMode::Poster => self.poster.render(&self.library),
        }
        let len = self.rows().len();
        self.selection_mut().clamp(len);
    }

    pub fn switch_view(&mut self, view: ViewMode, now: Instant) {
        if view == self.view {
            return;
        }
        if self.view == ViewMode::Poster {
            self.poster.update_viewport(std::iter::empty(), now);
            self.poster.hover_episode(None, now);
        }
        self.mode = AppMode::Normal;
        self.view = view;
        self.render_current();
        tracing::debug!(view = view.label(), "view switched");
    }

    pub fn surface(&self) -> &Surface {
        match self.view {
            ViewMode::List => &self.list.core().surface,
            ViewMode::Files => &self.files.core().surface,
            ViewMode::Poster => &self.poster.core().surface,
        }
    }

    /// Nodes of the current view in display order.
    pub fn rows(&self) -> Vec<NodeId> {
        match self.view {
            ViewMode::List => self.list.rows().iter().map(|r| r.node).collect(),
            ViewMode::Files => self.files.rows().iter().map(|r| r.node).collect(),
            ViewMode::Poster => self.poster.grid().iter().map(|c| c.node).collect(),
        }
    }

    pub fn selection(&self) -> Selection {
        self.selections[self.view.index()]
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selections[self.view.index()]
    }

    pub fn selected_node(&self) -> Option<NodeId> {
        self.rows().get(self.selection().index).copied()
    }

    /// Active sort of the current view.
    pub fn active_sort(&self) -> Option<SortKey> {
        match self.view {
            ViewMode::List => self.list.sorts().active(),
            ViewMode::Files => self.files.sorts().active(),
            ViewMode::Poster => None,
        }
    }

    // ── Navigation ───────────────────────────────────────────────────────

    /// Move the selection by `delta` rows, clamped to the view.
    pub fn move_selection(&mut self, delta: isize) {
        let len = self.rows().len();
        if len == 0 {
            return;
        }
        let selection = self.selection_mut();
        let target = selection.index as isize + delta;
        selection.index = target.clamp(0, len as isize - 1) as usize;
    }

    pub fn select_next(&mut self) {
        self.move_selection(1);
    }

    pub fn select_previous(&mut self) {
        self.move_selection(-1);
    }

    pub fn select_first(&mut self) {
        self.selection_mut().index = 0;
    }

    pub fn select_last(&mut self) {
        let len = self.rows().len();
        self.selection_mut().index = len.saturating_sub(1);
    }

    /// Poster grid rows move by a full line of cards.
    pub fn select_row_below(&mut self) {
        let step = if self.view == ViewMode::Poster {
            self.poster_columns.max(1) as isize
        } else {
            1
        };
        self.move_selection(step);
    }

    pub fn select_row_above(&mut self) {
        let step = if self.view == ViewMode::Poster {
            self.poster_columns.max(1) as isize
        } else {
            1
        };
        self.move_selection(-step);
    }

    // ── Activation ───────────────────────────────────────────────────────

    pub fn activate_selected(&mut self) {
        let Some(node) = self.selected_node() else {
            return;
        };
        let activation = match self.view {
            ViewMode::List => self.list.activate(node),
            ViewMode::Files => self.files.activate(node),
            ViewMode::Poster => self.poster.activate(node),
        };
        match activation {
            Activation::Series { show, seasons } => {
                if seasons.is_empty() {
                    self.set_status_message(format!("No episodes found for {}", show), true);
                } else {
                    self.mode = AppMode::Episodes(EpisodesState {
                        show,
                        seasons,
                        selected: 0,
                    });
                    self.hover_selected_episode();
                }
            }
            Activation::Toggled { .. } => {
                let len = self.rows().len();
                self.selection_mut().clamp(len);
            }
            Activation::Item(_) | Activation::None => {}
        }
    }

    /// Called when a presentation's selection callback fired.
    pub fn handle_activated(&mut self, name: &str) {
        self.last_activated = Some(name.to_string());
        self.set_status_message(format!("▶ {}", name), false);
    }

    /// Expand or collapse the selected folder. Collapsing a leaf or a closed
    /// folder moves to its parent.
    pub fn set_expanded(&mut self, expanded: bool) {
        if self.view != ViewMode::Files {
            return;
        }
        let Some(node) = self.selected_node() else {
            return;
        };
        let target = self.files.core().surface.node(node);
        if target.is_group() && target.expanded != expanded {
            self.files.set_expanded(node, expanded);
            return;
        }
        if !expanded {
            if let Some(parent) = target.parent {
                if let Some(index) = self.rows().iter().position(|n| *n == parent) {
                    self.selection_mut().index = index;
                }
            }
        }
    }

    // ── Sorting & cache ──────────────────────────────────────────────────

    /// Sort the current view. Failures reach the status bar through the
    /// error sink.
    pub fn sort(&mut self, key: SortKey) {
        let result = match self.view {
            ViewMode::List => self.list.sort_by(key),
            ViewMode::Files => self.files.sort_by(key),
            ViewMode::Poster => {
                self.set_status_message("Sorting is not available in the poster view", true);
                return;
            }
        };
        if result.is_ok() {
            self.set_status_message(format!("Sorted by {}", key.label()), false);
        }
    }

    /// Drop the generated nodes of the current view and render again.
    pub fn refresh(&mut self) {
        match self.view {
            ViewMode::List => self.list.clear_cache(),
            ViewMode::Files => self.files.clear_cache(),
            ViewMode::Poster => self.poster.clear_cache(),
        }
        self.render_current();
        self.set_status_message(
            format!("Cache cleared, {} items rendered", self.library.len()),
            false,
        );
    }

    // ── Search ───────────────────────────────────────────────────────────

    pub fn start_search(&mut self) {
        if self.view != ViewMode::List {
            return;
        }
        self.search_input = self.list.query().to_string();
        self.mode = AppMode::Search;
    }

    pub fn search_input_char(&mut self, c: char) {
        self.search_input.push(c);
        self.apply_search();
    }

    pub fn search_backspace(&mut self) {
        self.search_input.pop();
        self.apply_search();
    }

    /// Keep the query and return to navigation.
    pub fn confirm_search(&mut self) {
        self.mode = AppMode::Normal;
    }

    /// Clear the query and return to navigation.
    pub fn cancel_search(&mut self) {
        self.search_input.clear();
        self.apply_search();
        self.mode = AppMode::Normal;
    }

    fn apply_search(&mut self) {
        let shown = self.list.filter(&self.search_input);
        *self.selection_mut() = Selection::default();
        tracing::debug!(query = %self.search_input, shown, "list filtered");
    }

    // ── Episodes overlay ─────────────────────────────────────────────────

    /// Point the poster backdrop loader at the highlighted episode, or at
    /// nothing when the overlay is closed.
    fn hover_selected_episode(&mut self) {
        let item = match &self.mode {
            AppMode::Episodes(state) => state.selected_episode().map(|(_, e)| e.item.clone()),
            _ => None,
        };
        self.poster.hover_episode(item.as_ref(), Instant::now());
    }

    pub fn episodes_next(&mut self) {
        if let AppMode::Episodes(state) = &mut self.mode {
            if state.selected + 1 < state.episode_count() {
                state.selected += 1;
            }
        }
        self.hover_selected_episode();
    }

    pub fn episodes_previous(&mut self) {
        if let AppMode::Episodes(state) = &mut self.mode {
            state.selected = state.selected.saturating_sub(1);
        }
        self.hover_selected_episode();
    }

    /// Hand the highlighted episode to the selection callback and close the
    /// overlay.
    pub fn activate_episode(&mut self) {
        let AppMode::Episodes(state) = &self.mode else {
            return;
        };
        let Some((season, episode)) = state.selected_episode() else {
            return;
        };
        let item = episode.item.clone();
        tracing::info!(
            show = %state.show,
            season = %season.name,
            episode = episode.number,
            "playing episode"
        );
        self.close_overlay();
        self.poster.activate_episode(&item);
    }

    pub fn close_overlay(&mut self) {
        self.mode = AppMode::Normal;
        self.hover_selected_episode();
    }

    // ── Poster loading ───────────────────────────────────────────────────

    pub fn update_poster_viewport(&mut self, visible: Vec<NodeId>, now: Instant) {
        self.poster.update_viewport(visible, now);
    }

    /// Periodic housekeeping. Returns the image fetches to start.
    pub fn tick(&mut self, now: Instant) -> Vec<ImageRequest> {
        self.clear_expired_status(now);
        self.poster.poll(now)
    }

    pub fn image_loaded(
        &mut self,
        key: RequestKey,
        result: std::result::Result<ImageHandle, FetchError>,
    ) -> Completion {
        let completion = self.poster.complete(key, result);
        tracing::debug!(?key, ?completion, "image request settled");
        completion
    }

    // ── Status ───────────────────────────────────────────────────────────

    pub fn set_status_message(&mut self, text: impl Into<String>, is_error: bool) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            is_error,
            created: Instant::now(),
        });
    }

    /// Clear the status message once it has been shown long enough.
    pub fn clear_expired_status(&mut self, now: Instant) {
        if let Some(msg) = &self.status_message {
            if now.saturating_duration_since(msg.created).as_secs() >= STATUS_TIMEOUT_SECS {
                self.status_message = None;
            }
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
