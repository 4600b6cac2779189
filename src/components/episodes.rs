use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Widget},
};

use medialib_view::library::scheduler::CardState;

use crate::app::EpisodesState;
use crate::theme::ThemeColors;

/// Season and episode listing of a series card.
pub struct EpisodesWidget<'a> {
    state: &'a EpisodesState,
    theme: &'a ThemeColors,
    backdrop: Option<CardState>,
}

impl<'a> EpisodesWidget<'a> {
    pub fn new(state: &'a EpisodesState, theme: &'a ThemeColors) -> Self {
        Self {
            state,
            theme,
            backdrop: None,
        }
    }

    /// Loading state of the highlighted episode's backdrop.
    pub fn backdrop(mut self, state: Option<CardState>) -> Self {
        self.backdrop = state;
        self
    }

    fn title(&self) -> String {
        let marker = match self.backdrop {
            None => "",
            Some(CardState::Idle) => " · ░",
            Some(CardState::Loading) => " · ▒",
            Some(CardState::Loaded) | Some(CardState::Exhausted) => " · █",
        };
        format!(" {}{} ", self.state.show, marker)
    }

    fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect::new(x, y, width.min(area.width), height.min(area.height))
    }

    /// Listing lines and the line index of the selected episode.
    fn lines(&self) -> (Vec<Line<'a>>, usize) {
        let mut lines = Vec::new();
        let mut selected_line = 0;
        let mut episode_index = 0;

        let season_style = Style::default()
            .fg(self.theme.accent_fg)
            .add_modifier(Modifier::BOLD);
        for season in &self.state.seasons {
            lines.push(Line::from(Span::styled(season.name.clone(), season_style)));
            for episode in &season.episodes {
                let is_selected = episode_index == self.state.selected;
                if is_selected {
                    selected_line = lines.len();
                }
                let (marker, style) = if is_selected {
                    (
                        "▸ ",
                        Style::default()
                            .bg(self.theme.selected_bg)
                            .fg(self.theme.selected_fg)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    ("  ", Style::default().fg(self.theme.item_fg))
                };
                lines.push(Line::from(vec![
                    Span::styled(marker, Style::default().fg(self.theme.accent_fg)),
                    Span::styled(format!("E{:02}  ", episode.number), style),
                    Span::styled(episode.item.display_name.clone(), style),
                ]));
                episode_index += 1;
            }
        }
        (lines, selected_line)
    }
}

impl<'a> Widget for EpisodesWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 5 || area.width < 20 {
            return;
        }

        let dialog_width = (area.width * 60 / 100).clamp(30, 80);
        let dialog_height = (area.height * 70 / 100).clamp(8, 30);
        let rect = Self::centered_rect(dialog_width, dialog_height, area);

        Clear.render(rect, buf);

        let block = Block::default()
            .title(self.title())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.overlay_border_fg))
            .style(Style::default().bg(self.theme.overlay_bg))
            .padding(Padding::horizontal(1));
        let inner = block.inner(rect);
        block.render(rect, buf);
        if inner.height < 2 || inner.width == 0 {
            return;
        }

        // Last row holds the key hint.
        let list_height = (inner.height - 1) as usize;
        let (lines, selected_line) = self.lines();
        let scroll = (selected_line + 1).saturating_sub(list_height);

        for (i, line) in lines.iter().skip(scroll).take(list_height).enumerate() {
            buf.set_line(inner.x, inner.y + i as u16, line, inner.width);
        }

        let hint = Line::from(Span::styled(
            "[Enter] Play  [Esc] Close  [↑↓] Navigate",
            Style::default()
                .fg(self.theme.dim_fg)
                .add_modifier(Modifier::DIM),
        ));
        buf.set_line(inner.x, inner.y + inner.height - 1, &hint, inner.width);
    }
}
