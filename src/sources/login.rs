use anyhow::{Context, Result};
use chrono::{DateTime, Local, Timelike};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::LoginConfig;
use crate::events::Event;
use crate::monitor::EventMonitor;
use crate::system::FileSystemInterface;

/// What has been shown so far, persisted between runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginState {
    #[serde(default)]
    pub has_shown_welcome: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_shown: Option<DateTime<Local>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WelcomeDecision {
    Show,
    /// Already greeted; `remaining` is set while the cooldown runs
    Skip { remaining: Option<chrono::Duration> },
}

impl LoginState {
    /// Greet on first launch ever, or on the first show of a calendar day
    /// once the cooldown has passed
    pub fn decide(&self, now: DateTime<Local>, cooldown: chrono::Duration) -> WelcomeDecision {
        if !self.has_shown_welcome {
            return WelcomeDecision::Show;
        }

        let Some(last_shown) = self.last_shown else {
            return WelcomeDecision::Show;
        };

        let first_today = last_shown.date_naive() != now.date_naive();
        let elapsed = now.signed_duration_since(last_shown);
        let cooldown_expired = elapsed >= cooldown;

        if first_today && cooldown_expired {
            WelcomeDecision::Show
        } else if cooldown_expired {
            WelcomeDecision::Skip { remaining: None }
        } else {
            WelcomeDecision::Skip {
                remaining: Some(cooldown - elapsed),
            }
        }
    }

    pub fn mark_shown(&mut self, now: DateTime<Local>) {
        self.has_shown_welcome = true;
        self.last_shown = Some(now);
    }
}

/// Posts a welcome event when the user comes back to the machine
pub struct LoginMonitor<F: FileSystemInterface> {
    file_system: F,
    state_path: PathBuf,
    cooldown: chrono::Duration,
    post_delay: Duration,
    user_name: String,
}

impl<F: FileSystemInterface> LoginMonitor<F> {
    pub fn new(
        file_system: F,
        config: &LoginConfig,
        state_path: PathBuf,
        user_name: impl Into<String>,
    ) -> Self {
        Self {
            file_system,
            state_path,
            cooldown: config.cooldown(),
            post_delay: config.post_delay(),
            user_name: user_name.into(),
        }
    }

    /// Stored state; unreadable or corrupt state counts as a first launch
    pub fn load_state(&self) -> LoginState {
        if !self.file_system.file_exists(&self.state_path) {
            return LoginState::default();
        }

        let parsed = self
            .file_system
            .read_file(&self.state_path)
            .and_then(|content| toml::from_str(&content).context("Failed to parse login state"));

        match parsed {
            Ok(state) => state,
            Err(e) => {
                warn!(
                    "Ignoring login state at {}: {:#}",
                    self.state_path.display(),
                    e
                );
                LoginState::default()
            }
        }
    }

    pub fn save_state(&self, state: &LoginState) -> Result<()> {
        if let Some(parent) = self.state_path.parent() {
            self.file_system.create_dir(parent)?;
        }
        let content = toml::to_string(state).context("Failed to serialize login state")?;
        self.file_system
            .write_file(&self.state_path, &content)
            .with_context(|| {
                format!("Failed to save login state: {}", self.state_path.display())
            })
    }

    /// Decide whether to greet at `now`, recording the show if so
    pub fn check_login_event(&self, now: DateTime<Local>) -> bool {
        let mut state = self.load_state();

        match state.decide(now, self.cooldown) {
            WelcomeDecision::Show => {
                info!("Welcome due, recording show");
                state.mark_shown(now);
                if let Err(e) = self.save_state(&state) {
                    warn!("{:#}", e);
                }
                true
            }
            WelcomeDecision::Skip {
                remaining: Some(remaining),
            } => {
                info!(
                    "Welcome cooldown active, {} minutes remaining",
                    remaining.num_minutes()
                );
                false
            }
            WelcomeDecision::Skip { remaining: None } => {
                debug!("Welcome already shown today, skipping");
                false
            }
        }
    }

    pub fn welcome_event(&self, now: DateTime<Local>) -> Event {
        Event::welcome(now.hour(), self.user_name.clone())
    }

    /// Post a welcome right away, regardless of stored state
    pub async fn trigger_welcome(&self, monitor: &EventMonitor) {
        info!("Manually triggering welcome");
        monitor.post_event(self.welcome_event(Local::now())).await;
    }
}

impl<F: FileSystemInterface + Send + 'static> LoginMonitor<F> {
    /// Check once; when due, post the welcome after the configured delay
    pub async fn run(self, monitor: EventMonitor, cancel: CancellationToken) {
        if !self.check_login_event(Local::now()) {
            return;
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Welcome cancelled before posting");
                return;
            }
            _ = tokio::time::sleep(self.post_delay) => {}
        }

        monitor.post_event(self.welcome_event(Local::now())).await;
    }
}
