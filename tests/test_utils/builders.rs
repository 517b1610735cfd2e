//! Test utility builders for creating events with known ids
//!
//! Individual methods may not be used by all tests, so dead code warnings are suppressed.

#![allow(dead_code)]

use notchy::events::{Event, EventId};
use std::time::Duration;
use uuid::Uuid;

/// Deterministic id, so scenarios can say "event 1", "event 2"
pub fn id(n: u128) -> EventId {
    EventId::from(Uuid::from_u128(n))
}

/// Builder for custom test events. Defaults to manual dismiss.
pub struct EventBuilder {
    id: EventId,
    title: String,
    priority: u8,
    auto_dismiss: bool,
    dismiss_after: Option<Duration>,
}

impl EventBuilder {
    pub fn new(n: u128) -> Self {
        Self {
            id: id(n),
            title: format!("event {n}"),
            priority: 50,
            auto_dismiss: false,
            dismiss_after: None,
        }
    }

    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Auto-dismiss after `secs` seconds
    pub fn auto_dismiss_after(mut self, secs: f64) -> Self {
        self.auto_dismiss = true;
        self.dismiss_after = Some(Duration::from_secs_f64(secs));
        self
    }

    /// autoDismiss set but no delay given
    pub fn auto_dismiss_without_delay(mut self) -> Self {
        self.auto_dismiss = true;
        self.dismiss_after = None;
        self
    }

    pub fn build(self) -> Event {
        Event::custom(self.title)
            .id(self.id)
            .priority(self.priority)
            .auto_dismiss(self.auto_dismiss)
            .dismiss_after(self.dismiss_after)
            .build()
    }
}
