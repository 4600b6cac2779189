use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use medialib_view::library::format::{format_mod_time, format_size};
use medialib_view::library::surface::{FlatRow, Node, Surface};

use crate::theme::ThemeColors;

/// Renders flattened surface rows: the files tree with box-drawing
/// connectors, or the flat list (all rows at depth 0).
pub struct TreeWidget<'a> {
    surface: &'a Surface,
    rows: &'a [FlatRow],
    selected: usize,
    scroll: usize,
    theme: &'a ThemeColors,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(surface: &'a Surface, rows: &'a [FlatRow], theme: &'a ThemeColors) -> Self {
        Self {
            surface,
            rows,
            selected: 0,
            scroll: 0,
            theme,
            block: None,
        }
    }

    pub fn selected(mut self, selected: usize, scroll: usize) -> Self {
        self.selected = selected;
        self.scroll = scroll;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Indentation prefix for the row at `index`.
    ///
    /// Continuation lines depend on whether each ancestor was the last of
    /// its siblings, found by walking back to the nearest shallower row.
    fn build_prefix(rows: &[FlatRow], index: usize) -> String {
        let row = &rows[index];
        if row.depth == 0 {
            return String::new();
        }

        let mut prefix = String::new();
        for d in 1..row.depth {
            let ancestor_is_last = rows[..index]
                .iter()
                .rev()
                .take_while(|r| r.depth >= d)
                .find(|r| r.depth == d)
                .is_some_and(|r| r.is_last_sibling);
            prefix.push_str(if ancestor_is_last { "   " } else { "│  " });
        }
        prefix.push_str(if row.is_last_sibling { "└──" } else { "├──" });
        prefix
    }

    fn indicator(node: &Node) -> &'static str {
        match (node.is_group(), node.expanded) {
            (true, true) => "▾ ",
            (true, false) => "▸ ",
            (false, _) => "  ",
        }
    }

    /// Size and modified columns: the rendered summary for folders, the
    /// item's own values for leaves.
    fn details(node: &Node) -> String {
        if let Some(summary) = &node.summary {
            return format!("{:>12}  {}", summary.size, summary.modified);
        }
        match (node.size, node.modified) {
            (Some(size), Some(modified)) => {
                format!("{:>12}  {}", format_size(size), format_mod_time(modified))
            }
            (Some(size), None) => format!("{:>12}", format_size(size)),
            _ => String::new(),
        }
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let visible_height = inner_area.height as usize;
        if self.rows.is_empty() || visible_height == 0 || inner_area.width == 0 {
            return;
        }
        let width = inner_area.width as usize;

        for (i, (idx, row)) in self
            .rows
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(visible_height)
            .enumerate()
        {
            let y = inner_area.y + i as u16;
            let node = self.surface.node(row.node);
            let is_selected = idx == self.selected;

            let name_style = if node.is_group() {
                Style::default()
                    .fg(self.theme.group_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.item_fg)
            };
            let tag_style = Style::default().fg(self.theme.tag_fg);
            let details_style = Style::default().fg(self.theme.summary_fg);

            let mut left = vec![
                Span::styled(Self::build_prefix(self.rows, idx), details_style),
                Span::styled(Self::indicator(node), name_style),
                Span::styled(node.label.clone(), name_style),
            ];
            if let Some(tag) = &node.tag {
                left.push(Span::styled(format!(" [{}]", tag), tag_style));
            }

            let details = Self::details(node);
            let used: usize = left.iter().map(|s| s.content.chars().count()).sum();
            let details_len = details.chars().count();
            let mut spans = left;
            if used + details_len + 1 <= width {
                spans.push(Span::raw(" ".repeat(width - used - details_len)));
                spans.push(Span::styled(details, details_style));
            }

            let mut line = Line::from(spans);
            if is_selected {
                line = line.patch_style(
                    Style::default()
                        .bg(self.theme.selected_bg)
                        .fg(self.theme.selected_fg)
                        .add_modifier(Modifier::BOLD),
                );
                buf.set_style(
                    Rect::new(inner_area.x, y, inner_area.width, 1),
                    Style::default().bg(self.theme.selected_bg),
                );
            }
            buf.set_line(inner_area.x, y, &line, inner_area.width);
        }
    }
}
