#![allow(dead_code)]

pub mod builders;

pub use builders::{EventBuilder, id};

use notchy::events::EventId;
use notchy::{DismissPolicy, EventMonitor, RecordingSurface};
use std::sync::Arc;

pub fn spawn_monitor(policy: DismissPolicy) -> (EventMonitor, RecordingSurface) {
    let surface = RecordingSurface::new();
    let monitor = EventMonitor::spawn(Arc::new(surface.clone()), policy);
    (monitor, surface)
}

/// Ids of the active events, head first
pub fn queue_ids(monitor: &EventMonitor) -> Vec<EventId> {
    monitor
        .active_events()
        .iter()
        .map(|event| event.id())
        .collect()
}

pub fn priorities(monitor: &EventMonitor) -> Vec<u8> {
    monitor
        .active_events()
        .iter()
        .map(|event| event.priority())
        .collect()
}
