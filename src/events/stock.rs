use chrono::{DateTime, Local};
use std::time::Duration;

use super::{Event, EventId, EventKind, MAX_PRIORITY, Rgb, Tint};

/// Part of the day used to pick the welcome greeting and theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl DayPeriod {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => DayPeriod::Morning,
            12..=16 => DayPeriod::Afternoon,
            17..=21 => DayPeriod::Evening,
            _ => DayPeriod::Night,
        }
    }

    pub fn greeting(&self) -> &'static str {
        match self {
            DayPeriod::Morning => "Good Morning!",
            DayPeriod::Afternoon => "Good Afternoon!",
            DayPeriod::Evening => "Good Evening!",
            DayPeriod::Night => "Welcome Back!",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            DayPeriod::Morning => "sunrise.fill",
            DayPeriod::Afternoon => "sun.max.fill",
            DayPeriod::Evening => "sunset.fill",
            DayPeriod::Night => "moon.stars.fill",
        }
    }

    fn tint(&self) -> Tint {
        match self {
            DayPeriod::Morning => Tint::Orange,
            DayPeriod::Afternoon => Tint::Yellow,
            DayPeriod::Evening => Tint::Pink,
            DayPeriod::Night => Tint::Indigo,
        }
    }

    fn background(&self) -> Rgb {
        match self {
            DayPeriod::Morning => Rgb::new(0.95, 0.7, 0.3),
            DayPeriod::Afternoon => Rgb::new(1.0, 0.85, 0.4),
            DayPeriod::Evening => Rgb::new(0.6, 0.25, 0.6),
            DayPeriod::Night => Rgb::new(0.4, 0.2, 0.7),
        }
    }
}

/// Render a 0.0..=1.0 battery fraction as a truncated whole percent
fn percent(level: f32) -> u32 {
    (level.clamp(0.0, 1.0) * 100.0) as u32
}

fn battery_message(
    device_name: &str,
    battery_level: Option<f32>,
    case_battery_level: Option<f32>,
) -> String {
    let mut message = device_name.to_string();
    if let Some(level) = battery_level {
        message.push_str(&format!(" • {}%", percent(level)));
    }
    if let Some(level) = case_battery_level {
        message.push_str(&format!(" (Case: {}%)", percent(level)));
    }
    message
}

impl Event {
    /// Start building a caller-defined event
    pub fn custom(title: impl Into<String>) -> CustomEventBuilder {
        CustomEventBuilder::new(title)
    }

    pub fn airpods_connected(
        device_name: impl Into<String>,
        battery_level: Option<f32>,
        case_battery_level: Option<f32>,
    ) -> Self {
        let device_name = device_name.into();
        Self {
            id: EventId::new(),
            priority: 65,
            title: "AirPods Connected".to_string(),
            message: Some(battery_message(
                &device_name,
                battery_level,
                case_battery_level,
            )),
            icon: "airpods".to_string(),
            tint: Tint::Green,
            background: Rgb::new(0.15, 0.6, 0.3),
            auto_dismiss: true,
            dismiss_after: Some(Duration::from_secs(4)),
            timestamp: Local::now(),
            kind: EventKind::AirPodsConnected {
                device_name,
                battery_level,
                case_battery_level,
            },
        }
    }

    pub fn airpods_disconnected(
        device_name: impl Into<String>,
        battery_level: Option<f32>,
        case_battery_level: Option<f32>,
    ) -> Self {
        let device_name = device_name.into();
        Self {
            id: EventId::new(),
            priority: 75,
            title: "AirPods Disconnected".to_string(),
            message: Some(battery_message(
                &device_name,
                battery_level,
                case_battery_level,
            )),
            icon: "airpods".to_string(),
            tint: Tint::Orange,
            background: Rgb::new(0.8, 0.4, 0.1),
            auto_dismiss: true,
            dismiss_after: Some(Duration::from_secs(3)),
            timestamp: Local::now(),
            kind: EventKind::AirPodsDisconnected {
                device_name,
                battery_level,
                case_battery_level,
            },
        }
    }

    /// Sustained high CPU usage. Stays until dismissed.
    pub fn cpu_alert(usage: f64) -> Self {
        Self {
            id: EventId::new(),
            priority: 80,
            title: "High CPU Usage".to_string(),
            message: Some(format!("{}% - System may be slow", usage as i64)),
            icon: "flame.fill".to_string(),
            tint: Tint::Red,
            background: Rgb::new(0.6, 0.15, 0.15),
            auto_dismiss: false,
            dismiss_after: None,
            timestamp: Local::now(),
            kind: EventKind::CpuAlert { usage },
        }
    }

    /// Greeting for the given local hour (0-23)
    pub fn welcome(hour: u32, user_name: impl Into<String>) -> Self {
        let period = DayPeriod::from_hour(hour);
        Self {
            id: EventId::new(),
            priority: 50,
            title: period.greeting().to_string(),
            message: Some(user_name.into()),
            icon: period.icon().to_string(),
            tint: period.tint(),
            background: period.background(),
            auto_dismiss: true,
            dismiss_after: Some(Duration::from_secs(5)),
            timestamp: Local::now(),
            kind: EventKind::Welcome { period },
        }
    }

    /// Plain notification preset
    pub fn notification(title: impl Into<String>, message: Option<String>) -> Self {
        CustomEventBuilder::new(title).message(message).build()
    }

    /// High-priority alert preset, dismissed manually
    pub fn alert(title: impl Into<String>, message: Option<String>) -> Self {
        CustomEventBuilder::new(title)
            .message(message)
            .priority(90)
            .icon("exclamationmark.triangle.fill")
            .tint(Tint::Red)
            .auto_dismiss(false)
            .dismiss_after(None)
            .build()
    }

    /// Low-priority informational preset
    pub fn info(title: impl Into<String>, message: Option<String>) -> Self {
        CustomEventBuilder::new(title)
            .message(message)
            .priority(30)
            .icon("info.circle.fill")
            .dismiss_after(Some(Duration::from_secs(10)))
            .build()
    }
}

/// Builder for [`EventKind::Custom`] events
#[derive(Debug, Clone)]
pub struct CustomEventBuilder {
    id: EventId,
    priority: u8,
    title: String,
    message: Option<String>,
    icon: String,
    tint: Tint,
    background: Option<Rgb>,
    auto_dismiss: bool,
    dismiss_after: Option<Duration>,
    timestamp: Option<DateTime<Local>>,
}

impl CustomEventBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: EventId::new(),
            priority: 50,
            title: title.into(),
            message: None,
            icon: "bell.fill".to_string(),
            tint: Tint::Blue,
            background: None,
            auto_dismiss: true,
            dismiss_after: Some(Duration::from_secs(5)),
            timestamp: None,
        }
    }

    pub fn id(mut self, id: EventId) -> Self {
        self.id = id;
        self
    }

    /// Clamped to 0..=100
    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority.min(MAX_PRIORITY);
        self
    }

    pub fn message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn tint(mut self, tint: Tint) -> Self {
        self.tint = tint;
        self
    }

    /// Defaults to the tint colour
    pub fn background(mut self, background: Rgb) -> Self {
        self.background = Some(background);
        self
    }

    pub fn auto_dismiss(mut self, auto_dismiss: bool) -> Self {
        self.auto_dismiss = auto_dismiss;
        self
    }

    pub fn dismiss_after(mut self, dismiss_after: Option<Duration>) -> Self {
        self.dismiss_after = dismiss_after;
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn build(self) -> Event {
        Event {
            id: self.id,
            priority: self.priority,
            title: self.title,
            message: self.message,
            icon: self.icon,
            tint: self.tint,
            background: self.background.unwrap_or_else(|| self.tint.rgb()),
            auto_dismiss: self.auto_dismiss,
            dismiss_after: self.dismiss_after,
            timestamp: self.timestamp.unwrap_or_else(Local::now),
            kind: EventKind::Custom,
        }
    }
}
