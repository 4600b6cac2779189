use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, MouseEvent};
use tokio::sync::mpsc;

use medialib_view::host::{ErrorSink, FetchError, ImageHandle};
use medialib_view::library::scheduler::RequestKey;
use medialib_view::model::ItemId;
use medialib_view::{Result, ViewError};

/// Application events.
#[derive(Debug)]
pub enum Event {
    /// A key press event.
    Key(KeyEvent),
    /// A mouse event.
    Mouse(MouseEvent),
    /// A periodic tick; drives poster timers.
    Tick,
    /// Terminal resize event.
    Resize(u16, u16),
    /// An image fetch settled.
    ImageLoaded {
        key: RequestKey,
        result: std::result::Result<ImageHandle, FetchError>,
    },
    /// An item was activated in one of the presentations.
    Activated { id: ItemId, name: String },
    /// A user-facing error raised by the engine.
    Error(String),
}

/// Async event handler that polls crossterm events and forwards them via a channel.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    /// Create a new EventHandler with the given tick rate.
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        tokio::spawn(async move {
            loop {
                let event = if event::poll(tick_rate).unwrap_or(false) {
                    match event::read() {
                        Ok(CrosstermEvent::Key(key)) => Event::Key(key),
                        Ok(CrosstermEvent::Mouse(mouse)) => Event::Mouse(mouse),
                        Ok(CrosstermEvent::Resize(w, h)) => Event::Resize(w, h),
                        _ => continue,
                    }
                } else {
                    Event::Tick
                };
                if event_tx.send(event).is_err() {
                    break;
                }
            }
        });

        Self { rx, tx }
    }

    /// Sender for tasks and callbacks that report back to the loop.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Receive the next event (waits until available).
    pub async fn next(&mut self) -> Result<Event> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| ViewError::Terminal("Event channel closed".into()))
    }
}

/// Error sink that forwards messages to the event loop, which shows them in
/// the status bar.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Event>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<Event>) -> Self {
        Self { tx }
    }
}

impl ErrorSink for ChannelSink {
    fn notify_error(&self, message: &str) {
        tracing::warn!("{}", message);
        let _ = self.tx.send(Event::Error(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_forwards_errors() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = ChannelSink::new(tx);
        sink.notify_error("Metadata is empty");
        match rx.try_recv() {
            Ok(Event::Error(message)) => assert_eq!(message, "Metadata is empty"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn channel_sink_survives_closed_loop() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        ChannelSink::new(tx).notify_error("ignored");
    }
}
