use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::monitor::DismissPolicy;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub cpu: CpuConfig,

    #[serde(default)]
    pub login: LoginConfig,

    #[serde(default)]
    pub airpods: AirPodsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub file_output: bool,
    pub json_format: bool,
    pub keep_days: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub dismiss_policy: DismissPolicy,
    /// Simulated collapse time of the console surface
    pub compact_animation_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Mirror each newly displayed event to Notification Center
    pub mirror_to_system: bool,
    pub include_message: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    pub enabled: bool,
    /// Percent (0-100) above which a reading counts as high
    pub threshold: f64,
    pub check_interval_secs: u64,
    /// How long readings must stay high before alerting
    pub min_sustained_secs: u64,
    pub alert_cooldown_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    pub enabled: bool,
    pub cooldown_hours: u64,
    pub post_delay_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirPodsConfig {
    pub enabled: bool,
    pub poll_interval_ms: u64,
    /// Substrings identifying AirPods output devices
    pub device_names: Vec<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file_output: true,
            json_format: false,
            keep_days: 7,
            log_dir: None,
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            dismiss_policy: DismissPolicy::CompactFirst,
            compact_animation_ms: 350,
        }
    }
}

impl EventsConfig {
    pub fn compact_animation(&self) -> Duration {
        Duration::from_millis(self.compact_animation_ms)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            mirror_to_system: false,
            include_message: true,
        }
    }
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 80.0,
            check_interval_secs: 30,
            min_sustained_secs: 10,
            alert_cooldown_secs: 60,
        }
    }
}

impl CpuConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs.max(1))
    }

    pub fn min_sustained(&self) -> Duration {
        Duration::from_secs(self.min_sustained_secs)
    }

    pub fn alert_cooldown(&self) -> Duration {
        Duration::from_secs(self.alert_cooldown_secs)
    }
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_hours: 4,
            post_delay_secs: 2,
            state_file: None,
        }
    }
}

impl LoginConfig {
    /// Longest accepted `cooldown_hours` (one year)
    pub const MAX_COOLDOWN_HOURS: u64 = 24 * 365;

    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cooldown_hours.min(Self::MAX_COOLDOWN_HOURS) as i64)
    }

    pub fn post_delay(&self) -> Duration {
        Duration::from_secs(self.post_delay_secs)
    }

    /// Configured state file or `~/.local/share/notchy/login_state.toml`
    pub fn state_path(&self) -> Result<PathBuf> {
        match &self.state_file {
            Some(path) => Ok(path.clone()),
            None => {
                let home_dir = dirs::home_dir().context("Failed to get home directory")?;
                Ok(home_dir.join(".local/share/notchy/login_state.toml"))
            }
        }
    }
}

impl Default for AirPodsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: 1000,
            device_names: vec![
                "AirPods".to_string(),
                "AirPods Pro".to_string(),
                "AirPods Max".to_string(),
            ],
        }
    }
}

impl AirPodsConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(100))
    }
}

impl Config {
    /// Problems that make the configuration unusable
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.cpu.threshold) {
            anyhow::bail!(
                "cpu.threshold must be between 0 and 100, got {}",
                self.cpu.threshold
            );
        }
        if self.login.cooldown_hours > LoginConfig::MAX_COOLDOWN_HOURS {
            anyhow::bail!(
                "login.cooldown_hours must be at most {}, got {}",
                LoginConfig::MAX_COOLDOWN_HOURS,
                self.login.cooldown_hours
            );
        }
        if self.airpods.enabled && self.airpods.device_names.iter().all(|n| n.is_empty()) {
            anyhow::bail!("airpods.device_names must contain at least one non-empty name");
        }
        Ok(())
    }
}
