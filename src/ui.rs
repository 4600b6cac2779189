use std::time::Instant;

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Tabs},
    Frame,
};

use medialib_view::library::format::format_size;

use crate::app::{App, AppMode, Selection, ViewMode};
use crate::components::episodes::EpisodesWidget;
use crate::components::poster::{grid_columns, grid_rows, visible_range, PosterGridWidget, CARD_HEIGHT, CARD_WIDTH};
use crate::components::search::SearchBarWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;
use crate::theme::ThemeColors;

/// Render the application UI.
pub fn render(app: &mut App, theme: &ThemeColors, frame: &mut Frame) {
    let area = frame.area();
    let search_height = if app.view == ViewMode::List { 1 } else { 0 };
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(search_height),
        Constraint::Length(1),
    ])
    .split(area);

    render_tabs(app, theme, frame, chunks[0]);
    match app.view {
        ViewMode::List | ViewMode::Files => render_rows(app, theme, frame, chunks[1]),
        ViewMode::Poster => render_poster(app, theme, frame, chunks[1]),
    }
    if app.view == ViewMode::List {
        let shown = app.rows().len();
        let query = if app.mode == AppMode::Search {
            app.search_input.as_str()
        } else {
            app.list.query()
        };
        let bar = SearchBarWidget::new(query, theme)
            .editing(app.mode == AppMode::Search)
            .counts(shown, app.library.len());
        frame.render_widget(bar, chunks[2]);
    }
    render_status(app, theme, frame, chunks[3]);

    if let AppMode::Episodes(state) = &app.mode {
        let backdrop = app.poster.backdrop().map(|loader| loader.state());
        frame.render_widget(EpisodesWidget::new(state, theme).backdrop(backdrop), area);
    }
}

fn render_tabs(app: &App, theme: &ThemeColors, frame: &mut Frame, area: Rect) {
    let titles: Vec<String> = ViewMode::ALL
        .iter()
        .enumerate()
        .map(|(i, view)| format!("{} {}", i + 1, view.label()))
        .collect();
    let selected = ViewMode::ALL.iter().position(|v| *v == app.view);
    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(theme.dim_fg))
        .highlight_style(
            Style::default()
                .fg(theme.border_focused_fg)
                .add_modifier(Modifier::BOLD),
        )
        .divider("│");
    frame.render_widget(tabs, area);
}

fn view_block<'a>(title: String, theme: &ThemeColors) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_fg))
}

fn render_rows(app: &mut App, theme: &ThemeColors, frame: &mut Frame, area: Rect) {
    let rows = match app.view {
        ViewMode::List => app.list.rows(),
        _ => app.files.rows(),
    };
    // account for border
    let visible_height = area.height.saturating_sub(2) as usize;
    app.selection_mut().update_scroll(visible_height);
    let selection = app.selection();

    let block = view_block(format!(" {} · {} rows ", app.view.label(), rows.len()), theme);
    let widget = TreeWidget::new(app.surface(), &rows, theme)
        .selected(selection.index, selection.scroll)
        .block(block);
    frame.render_widget(widget, area);
}

fn render_poster(app: &mut App, theme: &ThemeColors, frame: &mut Frame, area: Rect) {
    let block = view_block(format!(" Poster · {} cards ", app.poster.grid().len()), theme);
    let inner = block.inner(area);

    let columns = grid_columns(inner.width);
    let rows_visible = grid_rows(inner.height);
    app.poster_columns = columns;

    // Scroll by whole grid rows.
    let selection = app.selection();
    let mut by_row = Selection {
        index: selection.index / columns,
        scroll: selection.scroll,
    };
    by_row.update_scroll(rows_visible);
    app.selection_mut().scroll = by_row.scroll;

    let fits = inner.width >= CARD_WIDTH && inner.height >= CARD_HEIGHT;
    let visible: Vec<_> = {
        let grid = app.poster.grid();
        if fits {
            grid[visible_range(grid.len(), columns, rows_visible, by_row.scroll)]
                .iter()
                .map(|card| card.node)
                .collect()
        } else {
            Vec::new()
        }
    };
    app.update_poster_viewport(visible, Instant::now());

    let cards = app.poster.grid();
    let widget = PosterGridWidget::new(&cards, theme)
        .selected(selection.index, by_row.scroll)
        .block(block);
    frame.render_widget(widget, area);
}

fn key_hints(app: &App) -> &'static str {
    match (&app.mode, app.view) {
        (AppMode::Search, _) => " ⏎:keep  Esc:clear ",
        (AppMode::Episodes(_), _) => " ⏎:play  Esc:close ",
        (_, ViewMode::List) => " /:search  s/S/m:sort  r:refresh  q:quit ",
        (_, ViewMode::Files) => " l/h:open/close  s/S/m:sort  r:refresh  q:quit ",
        (_, ViewMode::Poster) => " ⏎:open  r:refresh  q:quit ",
    }
}

fn item_info(app: &App) -> String {
    let Some(id) = app.selected_node() else {
        return format!("{} items", app.library.len());
    };
    let node = app.surface().node(id);
    match node.item() {
        Some(item) => format!(
            "{} | {}",
            item.full_path.as_deref().unwrap_or(&item.display_name),
            format_size(item.size)
        ),
        None => format!("{}/ | {} entries", node.label, node.children.len()),
    }
}

fn render_status(app: &App, theme: &ThemeColors, frame: &mut Frame, area: Rect) {
    let info = item_info(app);
    let mut bar = StatusBarWidget::new(&info, key_hints(app), theme);
    if let Some(sort) = app.active_sort() {
        bar = bar.sort_label(sort.label());
    }
    if let Some(msg) = &app.status_message {
        bar = bar.status_message(&msg.text, msg.is_error);
    }
    frame.render_widget(bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;
    use medialib_view::host::LogSink;
    use medialib_view::library::PosterConfig;
    use medialib_view::model::{Item, Library};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn app(view: ViewMode) -> App {
        let library = Library::from_items(vec![
            Item::new("1", "Heat")
                .with_path("Movies/Heat.mkv")
                .with_size(2048)
                .with_meta("type", "Movie"),
            Item::new("2", "Pilot")
                .with_path("Shows/Lost/pilot.mkv")
                .with_meta("show", "Lost")
                .with_meta("episode", "S01E01"),
        ]);
        App::new(
            library,
            Arc::new(LogSink),
            PosterConfig::default(),
            None,
            view,
            || Box::new(|_, _| {}),
        )
    }

    fn draw(app: &mut App) -> String {
        let tc = theme::dark_theme();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| render(app, &tc, frame)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let mut s = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                s.push_str(buffer.cell((x, y)).unwrap().symbol());
            }
            s.push('\n');
        }
        s
    }

    #[test]
    fn files_view_shows_tabs_tree_and_status() {
        let mut app = app(ViewMode::Files);
        let screen = draw(&mut app);
        assert!(screen.contains("1 List"));
        assert!(screen.contains("3 Poster"));
        assert!(screen.contains("▸ Movies"));
        assert!(screen.contains("Movies/ | 1 entries"));
        assert!(screen.contains("q:quit"));
    }

    #[test]
    fn list_view_has_search_bar() {
        let mut app = app(ViewMode::List);
        let screen = draw(&mut app);
        assert!(screen.contains("press / to search"));
        assert!(screen.contains("Heat [movie]"));
    }

    #[test]
    fn poster_view_reports_visible_cards() {
        let mut app = app(ViewMode::Poster);
        let screen = draw(&mut app);
        assert!(screen.contains("Lost"));
        assert_eq!(app.poster_columns, 3);
        assert!(app.poster.next_deadline().is_some());
    }

    #[test]
    fn episodes_overlay_is_drawn_on_top() {
        let mut app = app(ViewMode::Poster);
        app.selection_mut().index = 1;
        app.activate_selected();
        let screen = draw(&mut app);
        assert!(screen.contains("Season 1"));
        assert!(screen.contains("E01  Pilot"));
    }
}
