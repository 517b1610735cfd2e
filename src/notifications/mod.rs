use anyhow::{Context, Result, bail};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::NotificationConfig;
use crate::events::{Event, EventId};
use crate::orchestrator::{ContentOrchestrator, DisplayMode};

/// Trait for sending notifications - allows for testing without system calls
pub trait NotificationSender: Send + Sync {
    fn send(&self, title: &str, body: &str) -> Result<()>;
}

/// Production notification sender using macOS osascript
#[derive(Debug, Clone, Copy, Default)]
pub struct MacOSNotificationSender;

impl NotificationSender for MacOSNotificationSender {
    fn send(&self, title: &str, body: &str) -> Result<()> {
        send_native_macos_notification(title, body)
    }
}

/// Test notification sender that records instead of sending
#[cfg(any(test, feature = "test-mocks"))]
#[derive(Clone, Default)]
pub struct TestNotificationSender {
    pub sent_notifications: Arc<std::sync::Mutex<Vec<(String, String)>>>,
}

#[cfg(any(test, feature = "test-mocks"))]
impl TestNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_sent_notifications(&self) -> Vec<(String, String)> {
        self.sent_notifications.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent_notifications.lock().unwrap().clear();
    }
}

#[cfg(any(test, feature = "test-mocks"))]
impl NotificationSender for TestNotificationSender {
    fn send(&self, title: &str, body: &str) -> Result<()> {
        debug!("Test notification: {} - {}", title, body);
        self.sent_notifications
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}

/// Mirrors displayed events to the system notification center
pub struct NotificationManager<T: NotificationSender = MacOSNotificationSender> {
    mirror_to_system: bool,
    include_message: bool,
    sender: T,
}

impl NotificationManager<MacOSNotificationSender> {
    pub fn new(config: &NotificationConfig) -> Self {
        Self::with_sender(config, MacOSNotificationSender)
    }
}

impl<T: NotificationSender> NotificationManager<T> {
    pub fn with_sender(config: &NotificationConfig, sender: T) -> Self {
        Self {
            mirror_to_system: config.mirror_to_system,
            include_message: config.include_message,
            sender,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.mirror_to_system
    }

    /// Mirror an event that just became the displayed one.
    ///
    /// Returns whether a notification was sent.
    pub fn event_displayed(&self, event: &Event) -> Result<bool> {
        if !self.mirror_to_system {
            return Ok(false);
        }

        let body = match (self.include_message, event.message()) {
            (true, Some(message)) => format!("{} {}", event.icon(), message),
            _ => event.icon().to_string(),
        };

        self.sender.send(event.title(), &body)?;
        info!("Mirrored event to notification center: {}", event.title());
        Ok(true)
    }

    /// Send a fixed banner, bypassing `mirror_to_system`
    pub fn test_notification(&self) -> Result<()> {
        info!("Sending test notification");
        self.sender
            .send("Notchy", "Notifications are working")
            .inspect_err(|e| {
                error!("Test notification failed: {:#}", e);
                error!("Check Do Not Disturb and that osascript may post notifications");
            })
            .context("Test notification failed")?;
        info!("Test notification sent");
        Ok(())
    }
}

/// Follows display-mode transitions, logging each one and mirroring
/// newly displayed events.
pub struct EventPresenter<T: NotificationSender + 'static> {
    orchestrator: ContentOrchestrator,
    notifications: Arc<NotificationManager<T>>,
    // Ids already mirrored while still active; re-showing after preemption stays quiet
    mirrored: HashSet<EventId>,
}

impl<T: NotificationSender + 'static> EventPresenter<T> {
    pub fn new(orchestrator: ContentOrchestrator, notifications: NotificationManager<T>) -> Self {
        Self {
            orchestrator,
            notifications: Arc::new(notifications),
            mirrored: HashSet::new(),
        }
    }

    /// Run until cancelled or until the event monitor goes away
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("Event presenter started");
        let mut modes = std::pin::pin!(self.orchestrator.modes());
        let mut last = None;
        loop {
            let mode = tokio::select! {
                _ = cancel.cancelled() => break,
                mode = modes.next() => mode,
            };
            let Some(mode) = mode else {
                break;
            };
            if last.replace(mode) == Some(mode) {
                continue;
            }
            self.present(mode).await;
        }
        info!("Event presenter stopped");
    }

    async fn present(&mut self, mode: DisplayMode) {
        let active: HashSet<EventId> = self
            .orchestrator
            .monitor()
            .active_events()
            .iter()
            .map(|event| event.id())
            .collect();
        self.mirrored.retain(|id| active.contains(id));

        let DisplayMode::Event(id) = mode else {
            info!("Notch showing context content");
            return;
        };

        let Some(event) = self
            .orchestrator
            .current_event()
            .filter(|event| event.id() == id)
        else {
            debug!("Event {} left the queue before it was presented", id);
            return;
        };

        info!("Notch showing {} event {}", event.kind().label(), event);

        if !self.notifications.is_enabled() || !self.mirrored.insert(id) {
            return;
        }

        let notifications = Arc::clone(&self.notifications);
        let result =
            tokio::task::spawn_blocking(move || notifications.event_displayed(&event)).await;
        match result {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!("Failed to mirror event {}: {:#}", id, e),
            Err(e) => warn!("Notification task failed for event {}: {}", id, e),
        }
    }
}

/// Post a banner through `osascript display notification`
fn send_native_macos_notification(title: &str, body: &str) -> Result<()> {
    let escape = |text: &str| text.replace('\\', "\\\\").replace('"', "\\\"");
    let script = format!(
        r#"display notification "{}" with title "{}""#,
        escape(body),
        escape(title)
    );

    let output = std::process::Command::new("osascript")
        .args(["-e", &script])
        .output()
        .context("Cannot run osascript")?;
    if !output.status.success() {
        bail!(
            "osascript exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}
