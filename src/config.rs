//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (later layers override earlier ones):
//! 1. Built-in defaults
//! 2. Global `~/.config/mlv/config.toml`
//! 3. Project-local `.mlv.toml` in the current working directory
//! 4. `$MLV_CONFIG` environment variable (path to config file)
//! 5. `--config <path>`
//! 6. CLI flags (`--view`, `--thumbnails`, `--no-mouse`, library path)

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::library::poster::{PosterConfig, DEFAULT_BACKDROP_DELAY, DEFAULT_BACKDROP_TYPE};
use crate::library::scheduler::DEFAULT_STAGE_DELAYS;

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Library snapshot file (overridden by CLI positional arg).
    pub library: Option<String>,
    /// View shown at startup: "list", "files", "poster".
    pub initial_view: Option<String>,
    /// Enable mouse support.
    pub mouse: Option<bool>,
}

/// Files (tree) view settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// Sort applied after the first render: "name", "size", "modified".
    pub sort_by: Option<String>,
}

/// Poster view settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PosterSection {
    /// Delay before each image stage; the last entry repeats.
    pub stage_delays_ms: Option<Vec<u64>>,
    /// Image types requested in order for regular cards.
    pub stage_types: Option<Vec<u32>>,
    /// Image types requested for series cards.
    pub series_stage_types: Option<Vec<u32>>,
    /// Directory holding `<id>_<type>.<ext>` artwork.
    pub thumbnails_dir: Option<String>,
    /// Delay before the backdrop of a highlighted episode is requested.
    pub backdrop_delay_ms: Option<u64>,
    /// Image type of episode backdrops.
    pub backdrop_type: Option<u32>,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "medialib_view=debug".
    pub level: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

/// Color settings for a single theme palette.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub list_bg: Option<String>,
    pub list_fg: Option<String>,
    pub selected_bg: Option<String>,
    pub selected_fg: Option<String>,
    pub group_fg: Option<String>,
    pub item_fg: Option<String>,
    pub tag_fg: Option<String>,
    pub summary_fg: Option<String>,
    pub card_border_fg: Option<String>,
    pub status_bg: Option<String>,
    pub status_fg: Option<String>,
    pub border_fg: Option<String>,
    pub overlay_bg: Option<String>,
    pub overlay_border_fg: Option<String>,
}

/// Theme configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color scheme: "dark", "light", "custom".
    pub scheme: Option<String>,
    /// Custom color overrides.
    pub custom: Option<ThemeColorsConfig>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub tree: TreeConfig,
    pub poster: PosterSection,
    pub logging: LoggingConfig,
    pub theme: ThemeConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

pub const DEFAULT_INITIAL_VIEW: &str = "files";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_STAGE_TYPES: [u32; 2] = [1, 3];
pub const DEFAULT_SERIES_STAGE_TYPES: [u32; 1] = [0];

/// Environment variable naming an extra config file.
pub const CONFIG_ENV: &str = "MLV_CONFIG";

// ── Config file locator ──────────────────────────────────────────────────────

/// Candidate config file paths, highest priority first.
///
/// Does not include the `--config` path.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".mlv.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("mlv").join("config.toml"));
    }

    paths
}

/// Read and parse a TOML config file. Returns `None` if the file doesn't
/// exist or can't be parsed (with a warning printed to stderr, since logging
/// is configured from the result).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!(
                "Warning: failed to parse config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                library: other.general.library.clone().or(self.general.library),
                initial_view: other
                    .general
                    .initial_view
                    .clone()
                    .or(self.general.initial_view),
                mouse: other.general.mouse.or(self.general.mouse),
            },
            tree: TreeConfig {
                sort_by: other.tree.sort_by.clone().or(self.tree.sort_by),
            },
            poster: PosterSection {
                stage_delays_ms: other
                    .poster
                    .stage_delays_ms
                    .clone()
                    .or(self.poster.stage_delays_ms),
                stage_types: other.poster.stage_types.clone().or(self.poster.stage_types),
                series_stage_types: other
                    .poster
                    .series_stage_types
                    .clone()
                    .or(self.poster.series_stage_types),
                thumbnails_dir: other
                    .poster
                    .thumbnails_dir
                    .clone()
                    .or(self.poster.thumbnails_dir),
                backdrop_delay_ms: other
                    .poster
                    .backdrop_delay_ms
                    .or(self.poster.backdrop_delay_ms),
                backdrop_type: other.poster.backdrop_type.or(self.poster.backdrop_type),
            },
            logging: LoggingConfig {
                level: other.logging.level.clone().or(self.logging.level),
                file: other.logging.file.clone().or(self.logging.file),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
                custom: other.theme.custom.clone().or(self.theme.custom),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Lowest priority first so higher layers overwrite.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    pub fn library_path(&self) -> Option<&str> {
        self.general.library.as_deref()
    }

    /// Startup view: "list", "files" or "poster".
    pub fn initial_view(&self) -> &str {
        self.general
            .initial_view
            .as_deref()
            .unwrap_or(DEFAULT_INITIAL_VIEW)
    }

    pub fn mouse_enabled(&self) -> bool {
        self.general.mouse.unwrap_or(true)
    }

    /// Initial files-view sort, if any.
    pub fn sort_by(&self) -> Option<&str> {
        self.tree.sort_by.as_deref()
    }

    pub fn stage_delays(&self) -> Vec<Duration> {
        match &self.poster.stage_delays_ms {
            Some(ms) if !ms.is_empty() => ms.iter().map(|&ms| Duration::from_millis(ms)).collect(),
            _ => DEFAULT_STAGE_DELAYS.to_vec(),
        }
    }

    pub fn stage_types(&self) -> Vec<u32> {
        match &self.poster.stage_types {
            Some(types) if !types.is_empty() => types.clone(),
            _ => DEFAULT_STAGE_TYPES.to_vec(),
        }
    }

    pub fn series_stage_types(&self) -> Vec<u32> {
        match &self.poster.series_stage_types {
            Some(types) if !types.is_empty() => types.clone(),
            _ => DEFAULT_SERIES_STAGE_TYPES.to_vec(),
        }
    }

    pub fn poster_config(&self) -> PosterConfig {
        PosterConfig {
            stage_delays: self.stage_delays(),
            stage_types: self.stage_types(),
            series_stage_types: self.series_stage_types(),
            backdrop_delay: self
                .poster
                .backdrop_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_BACKDROP_DELAY),
            backdrop_type: self.poster.backdrop_type.unwrap_or(DEFAULT_BACKDROP_TYPE),
        }
    }

    pub fn thumbnails_dir(&self) -> Option<&str> {
        self.poster.thumbnails_dir.as_deref()
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Option<&str> {
        self.logging.file.as_deref()
    }

    /// Theme scheme: "dark", "light", or "custom".
    pub fn theme_scheme(&self) -> &str {
        self.theme.scheme.as_deref().unwrap_or("dark")
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
