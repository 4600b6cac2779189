use std::ops::Range;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use medialib_view::library::poster::PosterCard;
use medialib_view::library::scheduler::CardState;

use crate::theme::ThemeColors;

pub const CARD_WIDTH: u16 = 24;
pub const CARD_HEIGHT: u16 = 6;

/// Cards that fit on one grid row.
pub fn grid_columns(width: u16) -> usize {
    (width / CARD_WIDTH).max(1) as usize
}

/// Grid rows that fit in `height`.
pub fn grid_rows(height: u16) -> usize {
    (height / CARD_HEIGHT).max(1) as usize
}

/// Card indices shown when the grid is scrolled to `scroll_row`.
pub fn visible_range(len: usize, columns: usize, rows: usize, scroll_row: usize) -> Range<usize> {
    let start = (scroll_row * columns).min(len);
    let end = ((scroll_row + rows) * columns).min(len);
    start..end
}

/// Poster grid: one bordered card per top-level node.
pub struct PosterGridWidget<'a> {
    cards: &'a [&'a PosterCard],
    selected: usize,
    scroll_row: usize,
    theme: &'a ThemeColors,
    block: Option<Block<'a>>,
}

impl<'a> PosterGridWidget<'a> {
    pub fn new(cards: &'a [&'a PosterCard], theme: &'a ThemeColors) -> Self {
        Self {
            cards,
            selected: 0,
            scroll_row: 0,
            theme,
            block: None,
        }
    }

    pub fn selected(mut self, selected: usize, scroll_row: usize) -> Self {
        self.selected = selected;
        self.scroll_row = scroll_row;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Placeholder artwork line for the card's loading state.
    fn artwork(card: &PosterCard) -> String {
        let stage = card
            .loader
            .best_image()
            .map(|image| format!(" type {}", image.stage_type))
            .unwrap_or_default();
        match card.loader.state() {
            CardState::Idle => "░░░░░░ waiting".to_string(),
            CardState::Loading if stage.is_empty() => "▒▒▒▒▒▒ loading".to_string(),
            CardState::Loading => format!("▓▓▓▓▒▒{}", stage),
            CardState::Loaded => format!("▓▓▓▓▓▓{}", stage),
            CardState::Exhausted => format!("██████{}", stage),
        }
    }

    fn caption(card: &PosterCard) -> Option<String> {
        match (&card.siblings, &card.badge) {
            (Some(siblings), _) => Some(format!(
                "Series · {} episode{}",
                siblings.len(),
                if siblings.len() == 1 { "" } else { "s" }
            )),
            (None, Some(badge)) => Some(badge.clone()),
            (None, None) => None,
        }
    }

    fn render_card(&self, card: &PosterCard, rect: Rect, is_selected: bool, buf: &mut Buffer) {
        let border_style = if is_selected {
            Style::default()
                .fg(self.theme.border_focused_fg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.theme.card_border_fg)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(
                format!(" {} ", card.title),
                Style::default().fg(self.theme.list_fg),
            ));
        let inner = block.inner(rect);
        block.render(rect, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let art_style = match card.loader.state() {
            CardState::Idle => Style::default().fg(self.theme.dim_fg),
            CardState::Loading => Style::default().fg(self.theme.warning_fg),
            CardState::Loaded | CardState::Exhausted => Style::default().fg(self.theme.success_fg),
        };
        buf.set_line(
            inner.x,
            inner.y,
            &Line::from(Span::styled(Self::artwork(card), art_style)),
            inner.width,
        );

        if inner.height > 1 {
            if let Some(caption) = Self::caption(card) {
                let style = Style::default().fg(self.theme.tag_fg);
                buf.set_line(
                    inner.x,
                    inner.y + 1,
                    &Line::from(Span::styled(caption, style)),
                    inner.width,
                );
            }
        }
    }
}

impl<'a> Widget for PosterGridWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };
        if self.cards.is_empty() || inner_area.width < CARD_WIDTH || inner_area.height < CARD_HEIGHT {
            return;
        }

        let columns = grid_columns(inner_area.width);
        let rows = grid_rows(inner_area.height);
        let range = visible_range(self.cards.len(), columns, rows, self.scroll_row);
        let first = range.start;

        for index in range {
            let offset = index - first;
            let rect = Rect::new(
                inner_area.x + (offset % columns) as u16 * CARD_WIDTH,
                inner_area.y + (offset / columns) as u16 * CARD_HEIGHT,
                CARD_WIDTH,
                CARD_HEIGHT,
            );
            self.render_card(self.cards[index], rect, index == self.selected, buf);
        }
    }
}
