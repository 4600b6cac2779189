//! Theme data model: built-in palettes and resolution from config.
//!
//! Two built-in palettes (dark and light) plus custom hex overrides from the
//! `[theme.custom]` config section.

use ratatui::style::Color;

use medialib_view::config::{ThemeColorsConfig, ThemeConfig};

// ── Runtime theme colors ─────────────────────────────────────────────────────

/// All runtime colors used in the UI.
///
/// Constructed from a config-level `ThemeConfig` via `resolve_theme()`.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // List / tree rows
    pub list_bg: Color,
    pub list_fg: Color,
    pub selected_bg: Color,
    pub selected_fg: Color,
    pub group_fg: Color,
    pub item_fg: Color,
    pub tag_fg: Color,
    pub summary_fg: Color,

    // Poster grid
    pub card_border_fg: Color,

    // Status bar
    pub status_bg: Color,
    pub status_fg: Color,

    // Borders & chrome
    pub border_fg: Color,
    pub border_focused_fg: Color,

    // Overlays (episodes, search)
    pub overlay_bg: Color,
    pub overlay_border_fg: Color,

    // Semantic colors (not configurable, consistent across themes)
    pub error_fg: Color,
    pub warning_fg: Color,
    pub success_fg: Color,
    pub info_fg: Color,
    pub accent_fg: Color,
    pub dim_fg: Color,
}

// ── Built-in palettes ────────────────────────────────────────────────────────

/// Dark theme using Catppuccin Mocha palette.
pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        list_bg: Color::Reset,
        list_fg: Color::Rgb(205, 214, 244),     // #cdd6f4 (text)
        selected_bg: Color::Rgb(69, 71, 90),    // #45475a (surface1)
        selected_fg: Color::Rgb(205, 214, 244), // #cdd6f4
        group_fg: Color::Rgb(137, 180, 250),    // #89b4fa (blue)
        item_fg: Color::Rgb(205, 214, 244),     // #cdd6f4
        tag_fg: Color::Rgb(250, 179, 135),      // #fab387 (peach)
        summary_fg: Color::Rgb(108, 112, 134),  // #6c7086 (overlay0)

        card_border_fg: Color::Rgb(88, 91, 112), // #585b70 (surface2)

        status_bg: Color::Rgb(30, 30, 46), // #1e1e2e (base)
        status_fg: Color::Rgb(205, 214, 244),

        border_fg: Color::Rgb(88, 91, 112),           // #585b70 (surface2)
        border_focused_fg: Color::Rgb(137, 180, 250), // #89b4fa (blue)

        overlay_bg: Color::Rgb(49, 50, 68), // #313244 (surface0)
        overlay_border_fg: Color::Rgb(137, 180, 250),

        error_fg: Color::Rgb(243, 139, 168),   // #f38ba8 (red)
        warning_fg: Color::Rgb(249, 226, 175), // #f9e2af (yellow)
        success_fg: Color::Rgb(166, 227, 161), // #a6e3a1 (green)
        info_fg: Color::Rgb(137, 180, 250),    // #89b4fa (blue)
        accent_fg: Color::Rgb(203, 166, 247),  // #cba6f7 (mauve)
        dim_fg: Color::Rgb(108, 112, 134),     // #6c7086
    }
}

/// Light theme using Catppuccin Latte palette.
pub fn light_theme() -> ThemeColors {
    ThemeColors {
        list_bg: Color::Reset,
        list_fg: Color::Rgb(76, 79, 105),      // #4c4f69 (text)
        selected_bg: Color::Rgb(204, 208, 218), // #ccd0da (surface1)
        selected_fg: Color::Rgb(76, 79, 105),
        group_fg: Color::Rgb(30, 102, 245), // #1e66f5 (blue)
        item_fg: Color::Rgb(76, 79, 105),
        tag_fg: Color::Rgb(254, 100, 11),       // #fe640b (peach)
        summary_fg: Color::Rgb(156, 160, 176),  // #9ca0b0 (overlay0)

        card_border_fg: Color::Rgb(172, 176, 190), // #acb0be (surface2)

        status_bg: Color::Rgb(239, 241, 245), // #eff1f5 (base)
        status_fg: Color::Rgb(76, 79, 105),

        border_fg: Color::Rgb(172, 176, 190),
        border_focused_fg: Color::Rgb(30, 102, 245),

        overlay_bg: Color::Rgb(230, 233, 239), // #e6e9ef (surface0)
        overlay_border_fg: Color::Rgb(30, 102, 245),

        error_fg: Color::Rgb(210, 15, 57),    // #d20f39 (red)
        warning_fg: Color::Rgb(223, 142, 29), // #df8e1d (yellow)
        success_fg: Color::Rgb(64, 160, 43),  // #40a02b (green)
        info_fg: Color::Rgb(30, 102, 245),
        accent_fg: Color::Rgb(136, 57, 239), // #8839ef (mauve)
        dim_fg: Color::Rgb(156, 160, 176),
    }
}

// ── Color parsing ────────────────────────────────────────────────────────────

/// Parse a hex color string like `"#aabbcc"` into a `ratatui::style::Color`.
/// Returns `None` for malformed input.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

// ── Theme resolution ─────────────────────────────────────────────────────────

/// Resolve the final `ThemeColors` from config.
///
/// - `"dark"` (default): dark Catppuccin palette
/// - `"light"`: light Catppuccin palette
/// - `"custom"`: start from dark palette, then override with custom hex values
pub fn resolve_theme(config: &ThemeConfig) -> ThemeColors {
    match config.scheme.as_deref().unwrap_or("dark") {
        "light" => light_theme(),
        "custom" => {
            let mut theme = dark_theme();
            if let Some(custom) = &config.custom {
                apply_custom_colors(&mut theme, custom);
            }
            theme
        }
        _ => dark_theme(),
    }
}

/// Apply custom hex color overrides on top of an existing theme.
/// Malformed values keep the palette color.
fn apply_custom_colors(theme: &mut ThemeColors, custom: &ThemeColorsConfig) {
    macro_rules! override_colors {
        ($($field:ident),* $(,)?) => {
            $(
                if let Some(color) = custom.$field.as_deref().and_then(parse_hex_color) {
                    theme.$field = color;
                }
            )*
        };
    }

    override_colors!(
        list_bg,
        list_fg,
        selected_bg,
        selected_fg,
        group_fg,
        item_fg,
        tag_fg,
        summary_fg,
        card_border_fg,
        status_bg,
        status_fg,
        border_fg,
        overlay_bg,
        overlay_border_fg,
    );
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color_valid() {
        assert_eq!(parse_hex_color("#ff0000"), Some(Color::Rgb(255, 0, 0)));
        assert_eq!(parse_hex_color("#1a1b26"), Some(Color::Rgb(26, 27, 38)));
        assert_eq!(parse_hex_color("00ff00"), Some(Color::Rgb(0, 255, 0)));
    }

    #[test]
    fn test_parse_hex_color_invalid() {
        assert_eq!(parse_hex_color("#zzzzzz"), None);
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color(""), None);
        assert_eq!(parse_hex_color("#ééé"), None);
    }

    #[test]
    fn test_resolve_schemes() {
        let dark = resolve_theme(&ThemeConfig::default());
        assert_eq!(dark.group_fg, Color::Rgb(137, 180, 250));

        let light = resolve_theme(&ThemeConfig {
            scheme: Some("light".to_string()),
            custom: None,
        });
        assert_eq!(light.group_fg, Color::Rgb(30, 102, 245));

        let unknown = resolve_theme(&ThemeConfig {
            scheme: Some("neon".to_string()),
            custom: None,
        });
        assert_eq!(unknown.group_fg, dark.group_fg);
    }

    #[test]
    fn test_resolve_custom_overrides() {
        let config = ThemeConfig {
            scheme: Some("custom".to_string()),
            custom: Some(ThemeColorsConfig {
                list_bg: Some("#1a1b26".to_string()),
                tag_fg: Some("#c0caf5".to_string()),
                selected_bg: Some("not a color".to_string()),
                ..Default::default()
            }),
        };
        let theme = resolve_theme(&config);
        assert_eq!(theme.list_bg, Color::Rgb(26, 27, 38));
        assert_eq!(theme.tag_fg, Color::Rgb(192, 202, 245));
        assert_eq!(theme.selected_bg, dark_theme().selected_bg);
        assert_eq!(theme.group_fg, Color::Rgb(137, 180, 250));
    }

    #[test]
    fn test_dark_and_light_different() {
        let dark = dark_theme();
        let light = light_theme();
        assert_ne!(dark.list_fg, light.list_fg);
        assert_ne!(dark.selected_bg, light.selected_bg);
        assert_ne!(dark.error_fg, light.error_fg);
    }
}
