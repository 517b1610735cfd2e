use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info};

use crate::events::{Event, EventId};
use crate::monitor::EventMonitor;

/// What the notch should render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayMode {
    /// No event active, render ambient content for the foreground app
    Context,
    /// Render the event with this id (the queue head)
    Event(EventId),
}

impl DisplayMode {
    /// Context iff `events` is empty, otherwise the head's id
    pub fn from_events(events: &[Arc<Event>]) -> Self {
        match events.first() {
            Some(head) => DisplayMode::Event(head.id()),
            None => DisplayMode::Context,
        }
    }

    pub fn event_id(&self) -> Option<EventId> {
        match self {
            DisplayMode::Event(id) => Some(*id),
            DisplayMode::Context => None,
        }
    }
}

/// Decides between context content and event content for the notch.
///
/// The mode is derived from the monitor's latest published queue on every
/// read, so it can never lag behind a completed queue mutation.
#[derive(Clone)]
pub struct ContentOrchestrator {
    monitor: EventMonitor,
    events: watch::Receiver<Vec<Arc<Event>>>,
}

impl ContentOrchestrator {
    pub fn new(monitor: EventMonitor) -> Self {
        let events = monitor.subscribe();
        info!("Content orchestrator initialized");
        Self { monitor, events }
    }

    pub fn mode(&self) -> DisplayMode {
        DisplayMode::from_events(&self.events.borrow())
    }

    /// The event being displayed, if any.
    ///
    /// While the last event is being compacted away it is still returned,
    /// until its removal completes.
    pub fn current_event(&self) -> Option<Arc<Event>> {
        let events = self.events.borrow();
        match DisplayMode::from_events(&events) {
            DisplayMode::Event(id) => events.iter().find(|event| event.id() == id).cloned(),
            DisplayMode::Context => None,
        }
    }

    /// Dismiss whatever event is shown. No-op in context mode.
    pub async fn dismiss_current_event(&self) {
        match self.mode() {
            DisplayMode::Event(id) => {
                info!("Dismissing current event {}", id);
                self.monitor.dismiss_event(id).await;
            }
            DisplayMode::Context => debug!("No event displayed, nothing to dismiss"),
        }
    }

    /// Wait for the next mode transition and return the new mode.
    ///
    /// Returns `None` once the monitor has gone away.
    pub async fn next_transition(&mut self) -> Option<DisplayMode> {
        let current = self.mode();
        loop {
            self.events.changed().await.ok()?;
            let next = self.mode();
            if next != current {
                debug!("Display mode {:?} -> {:?}", current, next);
                return Some(next);
            }
        }
    }

    /// Stream of modes: the current one first, then every published change.
    /// Consecutive equal modes are not collapsed.
    pub fn modes(&self) -> impl Stream<Item = DisplayMode> + use<> {
        WatchStream::new(self.events.clone()).map(|events| DisplayMode::from_events(&events))
    }

    pub fn monitor(&self) -> &EventMonitor {
        &self.monitor
    }
}
