//! Terminal event abstraction.
//!
//! Wraps crossterm events into a simpler enum and runs a background task that
//! forwards them over a channel so the main loop stays non-blocking.  Ticks
//! double as the frame clock for scroll animation.

use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, MouseEvent};
use tokio::sync::mpsc;

/// High-level events consumed by the application.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize,
    Tick,
}

/// Spawns a blocking reader that polls the terminal and forwards events
/// through the returned channel, sending `Tick` whenever `frame` passes
/// without input.
pub fn spawn_event_reader(frame: Duration) -> mpsc::UnboundedReceiver<AppEvent> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::task::spawn_blocking(move || loop {
        let app_event = match event::poll(frame) {
            Ok(true) => match event::read() {
                Ok(CtEvent::Key(k)) => AppEvent::Key(k),
                Ok(CtEvent::Mouse(m)) => AppEvent::Mouse(m),
                Ok(CtEvent::Resize(_, _)) => AppEvent::Resize,
                Ok(_) => continue,
                Err(err) => {
                    tracing::warn!("event reader: {err}");
                    continue;
                }
            },
            Ok(false) => AppEvent::Tick,
            Err(err) => {
                tracing::warn!("event reader: {err}");
                AppEvent::Tick
            }
        };
        if tx.send(app_event).is_err() {
            break; // receiver dropped
        }
    });

    rx
}
