pub mod stock;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

pub use stock::{CustomEventBuilder, DayPeriod};

/// Highest priority an event can carry. Larger values are clamped.
pub const MAX_PRIORITY: u8 = 100;

/// Unique identifier of a posted event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for EventId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accent colour used for an event's icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tint {
    Blue,
    Green,
    Orange,
    Red,
    Yellow,
    Pink,
    Indigo,
}

impl Tint {
    pub fn rgb(&self) -> Rgb {
        match self {
            Tint::Blue => Rgb::new(0.0, 0.48, 1.0),
            Tint::Green => Rgb::new(0.2, 0.78, 0.35),
            Tint::Orange => Rgb::new(1.0, 0.58, 0.0),
            Tint::Red => Rgb::new(1.0, 0.23, 0.19),
            Tint::Yellow => Rgb::new(1.0, 0.8, 0.0),
            Tint::Pink => Rgb::new(1.0, 0.18, 0.33),
            Tint::Indigo => Rgb::new(0.35, 0.34, 0.84),
        }
    }
}

/// Opaque colour, components in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Rgb {
    pub const fn new(red: f32, green: f32, blue: f32) -> Self {
        Self { red, green, blue }
    }
}

/// Render hint for the presentation layer. The engine never inspects it.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    AirPodsConnected {
        device_name: String,
        battery_level: Option<f32>,
        case_battery_level: Option<f32>,
    },
    AirPodsDisconnected {
        device_name: String,
        battery_level: Option<f32>,
        case_battery_level: Option<f32>,
    },
    CpuAlert {
        usage: f64,
    },
    Welcome {
        period: DayPeriod,
    },
    Custom,
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::AirPodsConnected { .. } => "airpods-connected",
            EventKind::AirPodsDisconnected { .. } => "airpods-disconnected",
            EventKind::CpuAlert { .. } => "cpu-alert",
            EventKind::Welcome { .. } => "welcome",
            EventKind::Custom => "custom",
        }
    }
}

/// An immutable alert candidate for the notch display.
///
/// Fields are read-only once constructed; use the stock constructors in
/// [`stock`] or [`Event::custom`] to build one.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    id: EventId,
    priority: u8,
    title: String,
    message: Option<String>,
    icon: String,
    tint: Tint,
    background: Rgb,
    auto_dismiss: bool,
    dismiss_after: Option<Duration>,
    timestamp: DateTime<Local>,
    kind: EventKind,
}

impl Event {
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Higher is more urgent, 0..=100
    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// SF Symbol name
    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn tint(&self) -> Tint {
        self.tint
    }

    /// Background colour of the notch surface while this event is shown
    pub fn background(&self) -> Rgb {
        self.background
    }

    pub fn auto_dismiss(&self) -> bool {
        self.auto_dismiss
    }

    pub fn dismiss_after(&self) -> Option<Duration> {
        self.dismiss_after
    }

    /// Delay after which the event removes itself, if one should be armed.
    ///
    /// `auto_dismiss` without a delay arms nothing.
    pub fn auto_dismiss_delay(&self) -> Option<Duration> {
        if self.auto_dismiss {
            self.dismiss_after
        } else {
            None
        }
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' (priority: {}", self.title, self.priority)?;
        match self.auto_dismiss_delay() {
            Some(delay) => write!(f, ", dismiss after {:.1}s)", delay.as_secs_f64()),
            None => write!(f, ", manual dismiss)"),
        }
    }
}
