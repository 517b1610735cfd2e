//! Flat mode resolver for the island: two boolean signals (media playing,
//! notification pending) plus ad-hoc timed modes, no queue.
//!
//! The queue-based [`crate::monitor::EventMonitor`] is what the daemon
//! runs. This resolver is kept for surfaces that only need a coarse mode.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IslandMode {
    Idle,
    Music,
    Notification,
    /// Reserved, no producer drives it
    Timer,
    /// Reserved, no producer drives it
    Activity,
}

impl IslandMode {
    pub fn priority(&self) -> u8 {
        match self {
            IslandMode::Notification => 100,
            IslandMode::Timer => 80,
            IslandMode::Music => 60,
            IslandMode::Activity => 40,
            IslandMode::Idle => 0,
        }
    }

    /// Mode implied by the two upstream signals: notification > music > idle
    pub fn resolve(notification_pending: bool, media_active: bool) -> Self {
        if notification_pending {
            IslandMode::Notification
        } else if media_active {
            IslandMode::Music
        } else {
            IslandMode::Idle
        }
    }
}

struct IslandState {
    media_active: bool,
    notification_pending: bool,
    reset_timer: Option<CancellationToken>,
}

struct Shared {
    state: Mutex<IslandState>,
    mode: watch::Sender<IslandMode>,
}

/// Cloneable handle; all clones share one state.
#[derive(Clone)]
pub struct IslandStateManager {
    shared: Arc<Shared>,
}

impl IslandStateManager {
    pub fn new() -> Self {
        let (mode, _) = watch::channel(IslandMode::Idle);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(IslandState {
                    media_active: false,
                    notification_pending: false,
                    reset_timer: None,
                }),
                mode,
            }),
        }
    }

    pub fn current_mode(&self) -> IslandMode {
        *self.shared.mode.borrow()
    }

    pub fn should_show_content(&self) -> bool {
        self.current_mode() != IslandMode::Idle
    }

    pub fn subscribe(&self) -> watch::Receiver<IslandMode> {
        self.shared.mode.subscribe()
    }

    pub fn set_media_active(&self, active: bool) {
        let mut state = self.lock_state();
        state.media_active = active;
        self.recompute(&state);
    }

    pub fn set_notification_pending(&self, pending: bool) {
        let mut state = self.lock_state();
        state.notification_pending = pending;
        self.recompute(&state);
    }

    /// Switch to `mode` now. With a duration, the mode resets to idle after
    /// it elapses unless another `set_mode` comes first: each call cancels
    /// the previous reset timer.
    ///
    /// Must be called inside a Tokio runtime when `duration` is given.
    pub fn set_mode(&self, mode: IslandMode, duration: Option<Duration>) {
        let mut state = self.lock_state();
        if let Some(previous) = state.reset_timer.take() {
            previous.cancel();
        }

        self.publish(mode);

        if let Some(duration) = duration {
            let cancel = CancellationToken::new();
            state.reset_timer = Some(cancel.clone());
            let shared = Arc::downgrade(&self.shared);
            tokio::spawn(reset_after(shared, mode, duration, cancel));
        }
    }

    /// Back to idle, but only if `mode` is still the current one
    pub fn dismiss_mode(&self, mode: IslandMode) {
        let _state = self.lock_state();
        if self.current_mode() == mode {
            self.publish(IslandMode::Idle);
        }
    }

    pub fn show_notification(&self, duration: Duration) {
        self.set_mode(IslandMode::Notification, Some(duration));
    }

    fn expire(&self, mode: IslandMode, cancel: &CancellationToken) {
        let mut state = self.lock_state();
        // A newer set_mode may have replaced this timer after it woke
        if cancel.is_cancelled() {
            return;
        }
        state.reset_timer = None;
        debug!("Timed island mode {:?} expired", mode);
        if self.current_mode() == mode {
            self.publish(IslandMode::Idle);
        }
    }

    fn recompute(&self, state: &IslandState) {
        let mode = IslandMode::resolve(state.notification_pending, state.media_active);
        self.publish(mode);
    }

    fn publish(&self, mode: IslandMode) {
        let previous = self.shared.mode.send_replace(mode);
        if previous != mode {
            info!("Island mode {:?} -> {:?}", previous, mode);
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, IslandState> {
        // State stays consistent even if a holder panicked
        self.shared
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for IslandStateManager {
    fn default() -> Self {
        Self::new()
    }
}

async fn reset_after(
    shared: Weak<Shared>,
    mode: IslandMode,
    duration: Duration,
    cancel: CancellationToken,
) {
    tokio::select! {
        _ = cancel.cancelled() => return,
        _ = tokio::time::sleep(duration) => {}
    }

    let Some(shared) = shared.upgrade() else {
        return;
    };
    IslandStateManager { shared }.expire(mode, &cancel);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_table() {
        let mut modes = [
            IslandMode::Idle,
            IslandMode::Activity,
            IslandMode::Notification,
            IslandMode::Music,
            IslandMode::Timer,
        ];
        modes.sort_by_key(|mode| std::cmp::Reverse(mode.priority()));
        assert_eq!(
            modes,
            [
                IslandMode::Notification,
                IslandMode::Timer,
                IslandMode::Music,
                IslandMode::Activity,
                IslandMode::Idle,
            ]
        );
    }

    #[test]
    fn test_resolve_prefers_notification() {
        assert_eq!(IslandMode::resolve(true, true), IslandMode::Notification);
        assert_eq!(IslandMode::resolve(false, true), IslandMode::Music);
        assert_eq!(IslandMode::resolve(false, false), IslandMode::Idle);
    }

    #[test]
    fn test_signals_recompute_mode() {
        let manager = IslandStateManager::new();
        assert!(!manager.should_show_content());

        manager.set_media_active(true);
        assert_eq!(manager.current_mode(), IslandMode::Music);

        manager.set_notification_pending(true);
        assert_eq!(manager.current_mode(), IslandMode::Notification);

        manager.set_notification_pending(false);
        assert_eq!(manager.current_mode(), IslandMode::Music);

        manager.set_media_active(false);
        assert_eq!(manager.current_mode(), IslandMode::Idle);
    }

    #[test]
    fn test_dismiss_mode_only_resets_matching_mode() {
        let manager = IslandStateManager::new();
        manager.set_mode(IslandMode::Music, None);

        manager.dismiss_mode(IslandMode::Notification);
        assert_eq!(manager.current_mode(), IslandMode::Music);

        manager.dismiss_mode(IslandMode::Music);
        assert_eq!(manager.current_mode(), IslandMode::Idle);
    }
}
