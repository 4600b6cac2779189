mod app;
mod components;
mod event;
mod handler;
mod theme;
mod tui;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;

use medialib_view::config::AppConfig;
use medialib_view::host::{ErrorSink, ImageSource};
use medialib_view::images::{NoArtwork, ThumbnailDir};
use medialib_view::library::scheduler::ImageRequest;
use medialib_view::library::SortKey;
use medialib_view::logging::init_logging;
use medialib_view::snapshot::{JsonSnapshotFile, SnapshotSource};
use medialib_view::{Result, ViewError};
use tokio::sync::mpsc::UnboundedSender;

use crate::app::{App, ViewMode};
use crate::event::{ChannelSink, Event, EventHandler};
use crate::tui::{install_panic_hook, Tui};

/// Browse a media library snapshot as a list, a folder tree or a poster grid.
#[derive(Parser, Debug)]
#[command(name = "mlv", version, about)]
struct Cli {
    /// Library snapshot (JSON object keyed by item id)
    library: Option<PathBuf>,

    /// Config file path (overrides the default lookup)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Initial view: list, files or poster
    #[arg(long)]
    view: Option<String>,

    /// Directory holding poster artwork named `<id>_<type>.<ext>`
    #[arg(long)]
    thumbnails: Option<PathBuf>,

    /// Disable mouse capture
    #[arg(long)]
    no_mouse: bool,
}

impl Cli {
    /// CLI flags expressed as the highest-priority config layer.
    fn overrides(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.general.library = self
            .library
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());
        config.general.initial_view = self.view.clone();
        if self.no_mouse {
            config.general.mouse = Some(false);
        }
        config.poster.thumbnails_dir = self
            .thumbnails
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());
        config
    }
}

/// Run one image fetch off the event loop. Results of canceled requests are
/// dropped.
fn spawn_fetch(source: Arc<dyn ImageSource>, request: ImageRequest, tx: UnboundedSender<Event>) {
    tokio::spawn(async move {
        let result = source
            .fetch_image(&request.item_id, request.stage_type)
            .await;
        if request.cancel.is_canceled() {
            tracing::debug!(key = ?request.key, "dropping canceled image result");
            return;
        }
        let _ = tx.send(Event::ImageLoaded {
            key: request.key,
            result,
        });
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));
    let log_file = init_logging(&config)?;

    let library_path = config.library_path().ok_or_else(|| {
        ViewError::InvalidPath("no library snapshot given (argument or [general] library)".into())
    })?;
    let library = JsonSnapshotFile::new(library_path).fetch_library_snapshot()?;
    let view: ViewMode = config.initial_view().parse()?;
    let initial_sort = config.sort_by().and_then(|name| {
        let key = SortKey::from_str(name);
        if key.is_none() {
            tracing::warn!(sort = name, "ignoring unknown sort field");
        }
        key
    });
    let images: Arc<dyn ImageSource> = match config.thumbnails_dir() {
        Some(dir) => Arc::new(ThumbnailDir::new(dir)),
        None => Arc::new(NoArtwork),
    };
    let theme = theme::resolve_theme(&config.theme);
    tracing::info!(
        items = library.len(),
        view = view.label(),
        log = %log_file.display(),
        "starting"
    );

    let mut events = EventHandler::new(Duration::from_millis(16));
    let event_tx = events.sender();
    let errors: Arc<dyn ErrorSink> = Arc::new(ChannelSink::new(event_tx.clone()));
    let activate_tx = event_tx.clone();
    let mut app = App::new(
        library,
        errors,
        config.poster_config(),
        initial_sort,
        view,
        move || {
            let tx = activate_tx.clone();
            Box::new(move |id, item| {
                let _ = tx.send(Event::Activated {
                    id: id.clone(),
                    name: item.display_name.clone(),
                });
            })
        },
    );

    install_panic_hook();
    let mut tui = Tui::new(config.mouse_enabled())?;

    loop {
        tui.draw(&mut app, &theme)?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            Event::Tick => {
                for request in app.tick(Instant::now()) {
                    spawn_fetch(images.clone(), request, event_tx.clone());
                }
            }
            Event::ImageLoaded { key, result } => {
                app.image_loaded(key, result);
            }
            Event::Activated { id, name } => {
                tracing::info!(%id, "item activated");
                app.handle_activated(&name);
            }
            Event::Error(message) => app.set_status_message(message, true),
            Event::Mouse(_) | Event::Resize(_, _) => {}
        }

        if app.should_quit {
            break;
        }
    }

    tui.restore()?;
    Ok(())
}
