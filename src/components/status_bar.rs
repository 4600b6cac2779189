use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

/// Status bar: selected item, sort state and key hints, or a status message.
pub struct StatusBarWidget<'a> {
    item_info: &'a str,
    key_hints: &'a str,
    theme: &'a ThemeColors,
    sort_label: Option<&'a str>,
    status_message: Option<&'a str>,
    is_error: bool,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(item_info: &'a str, key_hints: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            item_info,
            key_hints,
            theme,
            sort_label: None,
            status_message: None,
            is_error: false,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }

    pub fn sort_label(mut self, label: &'a str) -> Self {
        self.sort_label = Some(label);
        self
    }
}

/// Truncate to at most `max` characters.
fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_fg)
            } else {
                Style::default().fg(self.theme.success_fg)
            };
            let display = format!("{:<width$}", truncate(msg, width), width = width);
            buf.set_line(area.x, area.y, &Line::from(Span::styled(display, style)), area.width);
            return;
        }

        // Normal bar: [item info] [sort] ... [key hints]
        let hints_len = self.key_hints.chars().count();
        let sort_display = self
            .sort_label
            .map(|label| format!(" ⇅ {} ", label))
            .unwrap_or_default();
        let sort_len = sort_display.chars().count();
        let info_budget = width.saturating_sub(hints_len).saturating_sub(sort_len);
        let info_display = truncate(self.item_info, info_budget);

        let info_style = Style::default().fg(self.theme.status_fg);
        let sort_style = Style::default()
            .fg(self.theme.accent_fg)
            .add_modifier(Modifier::BOLD);
        let hints_style = Style::default()
            .fg(self.theme.dim_fg)
            .add_modifier(Modifier::DIM);

        let gap = width
            .saturating_sub(info_display.chars().count())
            .saturating_sub(sort_len)
            .saturating_sub(hints_len);
        let spans = vec![
            Span::styled(info_display, info_style),
            Span::styled(sort_display, sort_style),
            Span::raw(" ".repeat(gap)),
            Span::styled(self.key_hints, hints_style),
        ];

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;
    use ratatui::style::Color;

    fn row(buf: &Buffer, width: u16) -> String {
        (0..width)
            .map(|x| buf.cell((x, 0)).unwrap().symbol().to_string())
            .collect()
    }

    #[test]
    fn test_status_message_success() {
        let tc = theme::dark_theme();
        let widget = StatusBarWidget::new("Heat", " q:quit ", &tc).status_message("Sorted by size", false);

        let area = Rect::new(0, 0, 80, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        assert!(row(&buf, 80).contains("Sorted by size"));
        assert_eq!(buf.cell((0, 0)).unwrap().fg, Color::Rgb(166, 227, 161));
    }

    #[test]
    fn test_status_message_error() {
        let tc = theme::dark_theme();
        let widget =
            StatusBarWidget::new("Heat", " q:quit ", &tc).status_message("Metadata is empty", true);

        let area = Rect::new(0, 0, 80, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        assert!(row(&buf, 80).contains("Metadata is empty"));
        let cell = buf.cell((0, 0)).unwrap();
        assert_eq!(cell.bg, Color::Rgb(243, 139, 168));
        assert_eq!(cell.fg, Color::Rgb(205, 214, 244));
    }

    #[test]
    fn test_normal_bar_rendering() {
        let tc = theme::dark_theme();
        let widget = StatusBarWidget::new("Movies/Heat.mkv | 1.00 GiBi", " s:name  q:quit ", &tc)
            .sort_label("size");

        let area = Rect::new(0, 0, 100, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        let content = row(&buf, 100);
        assert!(content.contains("Movies/Heat.mkv | 1.00 GiBi"));
        assert!(content.contains("⇅ size"));
        assert!(content.contains("q:quit"));
    }

    #[test]
    fn test_long_message_is_truncated() {
        let tc = theme::dark_theme();
        let long = "é".repeat(50);
        let widget = StatusBarWidget::new("", "", &tc).status_message(&long, false);
        let area = Rect::new(0, 0, 10, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        assert_eq!(row(&buf, 10), "é".repeat(10));
    }

    #[test]
    fn test_zero_area_does_not_panic() {
        let tc = theme::dark_theme();
        let widget = StatusBarWidget::new("info", " q:quit ", &tc);
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
    }
}
