//! Log setup. The terminal owns stdout, so events go to a file.
//!
//! Filter precedence: `MLV_LOG` env var, then `[logging] level`, then `info`.
//! File precedence: `[logging] file`, then `<cache dir>/mlv/mlv.log`.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::AppConfig;
use crate::error::{Result, ViewError};

/// Environment variable holding a filter directive.
pub const LOG_ENV: &str = "MLV_LOG";

/// Pick the filter directive from the env value or the config.
pub fn filter_directive(env_value: Option<String>, config: &AppConfig) -> String {
    env_value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| config.log_level().to_string())
}

pub fn build_filter(directive: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directive)
        .map_err(|e| ViewError::Config(format!("invalid log filter '{}': {}", directive, e)))
}

pub fn resolve_log_file(config: &AppConfig) -> Result<PathBuf> {
    if let Some(file) = config.log_file().filter(|f| !f.is_empty()) {
        return Ok(PathBuf::from(file));
    }
    dirs::cache_dir()
        .map(|dir| dir.join("mlv").join("mlv.log"))
        .ok_or_else(|| ViewError::Config("could not determine cache directory for log file".into()))
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Install the global subscriber. Returns the log file path.
pub fn init_logging(config: &AppConfig) -> Result<PathBuf> {
    let directive = filter_directive(std::env::var(LOG_ENV).ok(), config);
    let filter = build_filter(&directive)?;
    let path = resolve_log_file(config)?;
    let file = open_log_file(&path)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|e| ViewError::Config(format!("failed to install logger: {}", e)))?;

    tracing::info!(path = %path.display(), filter = %directive, "logging initialized");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggingConfig;

    fn with_logging(level: Option<&str>, file: Option<&str>) -> AppConfig {
        AppConfig {
            logging: LoggingConfig {
                level: level.map(str::to_string),
                file: file.map(str::to_string),
            },
            ..Default::default()
        }
    }

    #[test]
    fn env_directive_wins_over_config() {
        let cfg = with_logging(Some("warn"), None);
        assert_eq!(filter_directive(Some("debug".into()), &cfg), "debug");
        assert_eq!(filter_directive(None, &cfg), "warn");
        assert_eq!(filter_directive(Some("  ".into()), &cfg), "warn");
        assert_eq!(filter_directive(None, &AppConfig::default()), "info");
    }

    #[test]
    fn invalid_directive_is_config_error() {
        let err = build_filter("medialib_view=notalevel").unwrap_err();
        assert!(matches!(err, ViewError::Config(_)));
        assert!(build_filter("medialib_view=debug,info").is_ok());
    }

    #[test]
    fn configured_file_is_used() {
        let cfg = with_logging(None, Some("/var/tmp/mlv-test.log"));
        assert_eq!(
            resolve_log_file(&cfg).unwrap(),
            PathBuf::from("/var/tmp/mlv-test.log")
        );
    }

    #[test]
    fn default_file_lives_under_cache_dir() {
        if let Some(cache) = dirs::cache_dir() {
            assert_eq!(
                resolve_log_file(&AppConfig::default()).unwrap(),
                cache.join("mlv").join("mlv.log")
            );
        }
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("logs").join("mlv.log");
        open_log_file(&path).expect("open");
        assert!(path.exists());
    }
}
