//! Host observation seams.
//!
//! The engine never touches a windowing system.  Hosts implement the three
//! narrow observer traits below; each registration receives an
//! [`EventSink`] and hands back a [`Subscription`].  Dropping the
//! subscription deactivates the sink, so callbacks that fire after teardown
//! are discarded instead of mutating a dead feed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use super::error::{FeedError, Result};
use super::item::Page;
use super::pagination::PageRequest;

// ───────────────────────────────────────── events ────────────

/// Everything that can happen to a feed from the outside.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// Layout container size (width drives columns, height the viewport).
    ContainerResized { width: f64, height: f64 },
    /// Scroll container offset.
    Scrolled { top: f64 },
    /// A rendered card reported its real height.
    ItemMeasured { index: usize, height: f64 },
    /// The pagination sentinel entered or left the viewport.
    SentinelVisibility { visible: bool },
    /// The data source finished a page request.
    PageLoaded {
        request: PageRequest,
        outcome: std::result::Result<Page, FeedError>,
    },
}

// ───────────────────────────────────────── sink ──────────────

/// Sending half handed to observers.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<FeedEvent>,
    active: Arc<AtomicBool>,
}

impl EventSink {
    /// A fresh sink and the receiver the host's event loop drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<FeedEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                active: Arc::new(AtomicBool::new(true)),
            },
            rx,
        )
    }

    /// Derive a sink with its own lifetime, controlled by the returned
    /// [`Subscription`].
    pub fn scoped(&self, label: &'static str) -> (EventSink, Subscription) {
        let active = Arc::new(AtomicBool::new(true));
        let sink = EventSink {
            tx: self.tx.clone(),
            active: Arc::clone(&active),
        };
        (sink, Subscription { label, active })
    }

    /// Deliver an event.  Fails once the subscription is gone or the
    /// receiver has been dropped.
    pub fn send(&self, event: FeedEvent) -> Result<()> {
        if !self.is_active() {
            return Err(FeedError::ObserverClosed);
        }
        self.tx.send(event).map_err(|_| FeedError::ObserverClosed)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed) && !self.tx.is_closed()
    }
}

// ───────────────────────────────────────── subscription ──────

/// Registration handle; deregisters on drop.
#[derive(Debug)]
pub struct Subscription {
    label: &'static str,
    active: Arc<AtomicBool>,
}

impl Subscription {
    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Explicit form of dropping the handle.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.active.swap(false, Ordering::Relaxed) {
            tracing::trace!("observer `{}` unsubscribed", self.label);
        }
    }
}

// ───────────────────────────────────────── observer traits ───
//
// Implementations usually call `sink.scoped(label)`, keep the scoped sink
// for their callbacks and return the subscription.

/// Reports layout-container size changes as [`FeedEvent::ContainerResized`].
pub trait SizeObserver {
    fn observe_size(&mut self, sink: EventSink) -> Subscription;
}

/// Reports scroll-container offsets as [`FeedEvent::Scrolled`].
pub trait ScrollObserver {
    fn observe_scroll(&mut self, sink: EventSink) -> Subscription;
}

/// Reports sentinel visibility changes as [`FeedEvent::SentinelVisibility`].
pub trait VisibilityObserver {
    fn observe_visibility(&mut self, sink: EventSink) -> Subscription;
}
