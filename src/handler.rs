use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use medialib_view::library::SortKey;

use crate::app::{App, AppMode, ViewMode};

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }
    match app.mode {
        AppMode::Search => handle_search_mode(app, key),
        AppMode::Episodes(_) => handle_episodes_mode(app, key),
        AppMode::Normal => handle_normal_mode(app, key),
    }
}

fn handle_search_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.confirm_search(),
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Backspace => app.search_backspace(),
        KeyCode::Char(c) => app.search_input_char(c),
        _ => {}
    }
}

fn handle_episodes_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.episodes_next(),
        KeyCode::Char('k') | KeyCode::Up => app.episodes_previous(),
        KeyCode::Enter => app.activate_episode(),
        KeyCode::Esc | KeyCode::Char('q') => app.close_overlay(),
        _ => {}
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),

        // Views
        KeyCode::Char('1') => app.switch_view(ViewMode::List, Instant::now()),
        KeyCode::Char('2') => app.switch_view(ViewMode::Files, Instant::now()),
        KeyCode::Char('3') => app.switch_view(ViewMode::Poster, Instant::now()),

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => app.select_row_below(),
        KeyCode::Char('k') | KeyCode::Up => app.select_row_above(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        KeyCode::Char('l') | KeyCode::Right => match app.view {
            ViewMode::Poster => app.select_next(),
            _ => app.set_expanded(true),
        },
        KeyCode::Char('h') | KeyCode::Left => match app.view {
            ViewMode::Poster => app.select_previous(),
            _ => app.set_expanded(false),
        },
        KeyCode::Enter => app.activate_selected(),

        KeyCode::Char('/') => app.start_search(),

        // Sorting
        KeyCode::Char('s') => app.sort(SortKey::Name),
        KeyCode::Char('S') => app.sort(SortKey::Size),
        KeyCode::Char('m') => app.sort(SortKey::ModifiedTime),

        KeyCode::Char('r') => app.refresh(),
        _ => {}
    }
}
