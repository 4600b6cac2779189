use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

/// One-line search box of the list view.
pub struct SearchBarWidget<'a> {
    query: &'a str,
    editing: bool,
    shown: usize,
    total: usize,
    theme: &'a ThemeColors,
}

impl<'a> SearchBarWidget<'a> {
    pub fn new(query: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            query,
            editing: false,
            shown: 0,
            total: 0,
            theme,
        }
    }

    /// Show the cursor.
    pub fn editing(mut self, editing: bool) -> Self {
        self.editing = editing;
        self
    }

    pub fn counts(mut self, shown: usize, total: usize) -> Self {
        self.shown = shown;
        self.total = total;
        self
    }
}

impl<'a> Widget for SearchBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let prompt_style = Style::default()
            .fg(self.theme.accent_fg)
            .add_modifier(Modifier::BOLD);
        let input_style = Style::default().fg(self.theme.list_fg);
        let cursor_style = Style::default()
            .bg(self.theme.list_fg)
            .fg(self.theme.status_bg)
            .add_modifier(Modifier::BOLD);
        let count_style = Style::default().fg(self.theme.dim_fg);

        let mut spans = vec![Span::styled("/ ", prompt_style)];
        if self.query.is_empty() && !self.editing {
            spans.push(Span::styled("press / to search", count_style));
        } else {
            spans.push(Span::styled(self.query, input_style));
        }
        if self.editing {
            spans.push(Span::styled(" ", cursor_style));
        }

        let counts = format!(" {} of {} ", self.shown, self.total);
        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let width = area.width as usize;
        if used + counts.len() <= width {
            spans.push(Span::raw(" ".repeat(width - used - counts.len())));
            spans.push(Span::styled(counts, count_style));
        }

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;

    fn row(buf: &Buffer, width: u16) -> String {
        (0..width)
            .map(|x| buf.cell((x, 0)).unwrap().symbol().to_string())
            .collect()
    }

    #[test]
    fn shows_query_and_counts() {
        let tc = theme::dark_theme();
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);
        SearchBarWidget::new("jo sm", &tc)
            .counts(1, 12)
            .render(area, &mut buf);
        let content = row(&buf, 60);
        assert!(content.starts_with("/ jo sm"));
        assert!(content.contains("1 of 12"));
    }

    #[test]
    fn idle_bar_shows_hint() {
        let tc = theme::dark_theme();
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);
        SearchBarWidget::new("", &tc).render(area, &mut buf);
        assert!(row(&buf, 60).contains("press / to search"));
    }

    #[test]
    fn editing_draws_cursor() {
        let tc = theme::dark_theme();
        let area = Rect::new(0, 0, 40, 1);
        let mut buf = Buffer::empty(area);
        SearchBarWidget::new("ab", &tc)
            .editing(true)
            .render(area, &mut buf);
        assert_eq!(buf.cell((4, 0)).unwrap().bg, tc.list_fg);
    }
}
