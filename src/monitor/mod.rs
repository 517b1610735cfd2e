//! Event monitor: the single owner of the active event queue and of the
//! per-event auto-dismiss timers.
//!
//! All mutations run on one actor task fed by an unbounded command channel,
//! so producers on any task only need a cloned [`EventMonitor`] handle.
//! After every mutation the actor publishes the queue on a `watch` channel
//! before it looks at the next command; queries read that snapshot and never
//! wait on the actor.
//!
//! Host hooks go through [`NotchSurface`]: `expand` after each post,
//! `compact` (awaited) when the queue runs empty. Hooks must not call back
//! into the monitor and await it, the actor is busy running them.

pub mod queue;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::{Event, EventId};
use crate::surface::NotchSurface;

pub use queue::ActiveEventQueue;

/// Ordered snapshot of the active events, head first
pub type ActiveEvents = Vec<Arc<Event>>;

/// How the last remaining event is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissPolicy {
    /// Await the surface's compaction while the last event is still shown,
    /// then remove it
    #[default]
    CompactFirst,
    /// Remove right away, then compact if the queue ran empty
    Immediate,
}

enum Command {
    Post {
        event: Event,
        done: oneshot::Sender<()>,
    },
    Dismiss {
        id: EventId,
        done: oneshot::Sender<()>,
    },
    DismissAll {
        done: oneshot::Sender<()>,
    },
    TimerFired {
        id: EventId,
        generation: u64,
    },
    Shutdown {
        done: oneshot::Sender<()>,
    },
}

/// Handle to the event monitor actor. Cheap to clone.
///
/// Every operation is absorbed as a no-op once the actor has stopped.
#[derive(Clone)]
pub struct EventMonitor {
    commands: mpsc::UnboundedSender<Command>,
    events: watch::Receiver<ActiveEvents>,
}

impl EventMonitor {
    /// Start the monitor actor on the current Tokio runtime
    pub fn spawn(surface: Arc<dyn NotchSurface>, policy: DismissPolicy) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let (published, events) = watch::channel(ActiveEvents::new());

        let actor = MonitorActor {
            queue: ActiveEventQueue::new(),
            timers: HashMap::new(),
            next_generation: 0,
            surface,
            policy,
            published,
            commands: commands.downgrade(),
        };
        tokio::spawn(actor.run(receiver));

        info!("Event monitor started (dismiss policy: {:?})", policy);
        Self { commands, events }
    }

    /// Queue an event for display. Resolves once the queue has been updated.
    pub async fn post_event(&self, event: Event) {
        let (done, ack) = oneshot::channel();
        self.request(Command::Post { event, done }, ack).await;
    }

    /// Remove an event and cancel its timer. Unknown ids are ignored.
    ///
    /// Under [`DismissPolicy::CompactFirst`] this resolves after the
    /// surface has compacted when `id` was the last active event.
    pub async fn dismiss_event(&self, id: EventId) {
        let (done, ack) = oneshot::channel();
        self.request(Command::Dismiss { id, done }, ack).await;
    }

    /// Cancel every timer and clear the queue, compacting once if anything
    /// was active
    pub async fn dismiss_all(&self) {
        let (done, ack) = oneshot::channel();
        self.request(Command::DismissAll { done }, ack).await;
    }

    /// Stop the actor and cancel all pending timers
    pub async fn shutdown(&self) {
        let (done, ack) = oneshot::channel();
        self.request(Command::Shutdown { done }, ack).await;
    }

    /// Highest priority active event
    pub fn current_event(&self) -> Option<Arc<Event>> {
        self.events.borrow().first().cloned()
    }

    pub fn has_events(&self) -> bool {
        !self.events.borrow().is_empty()
    }

    pub fn active_events(&self) -> ActiveEvents {
        self.events.borrow().clone()
    }

    /// Receiver that observes every published queue change
    pub fn subscribe(&self) -> watch::Receiver<ActiveEvents> {
        self.events.clone()
    }

    async fn request(&self, command: Command, ack: oneshot::Receiver<()>) {
        if self.commands.send(command).is_err() {
            debug!("Event monitor is not running, ignoring request");
            return;
        }
        // Dropped without an answer only when the actor is tearing down
        let _ = ack.await;
    }
}

struct ArmedTimer {
    generation: u64,
    cancel: CancellationToken,
}

struct MonitorActor {
    queue: ActiveEventQueue,
    timers: HashMap<EventId, ArmedTimer>,
    next_generation: u64,
    surface: Arc<dyn NotchSurface>,
    policy: DismissPolicy,
    published: watch::Sender<ActiveEvents>,
    commands: mpsc::WeakUnboundedSender<Command>,
}

impl MonitorActor {
    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = receiver.recv().await {
            match command {
                Command::Post { event, done } => {
                    self.post(event);
                    let _ = done.send(());
                }
                Command::Dismiss { id, done } => {
                    self.dismiss(id).await;
                    let _ = done.send(());
                }
                Command::DismissAll { done } => {
                    self.dismiss_all().await;
                    let _ = done.send(());
                }
                Command::TimerFired { id, generation } => {
                    self.timer_fired(id, generation).await;
                }
                Command::Shutdown { done } => {
                    info!("Event monitor shutting down");
                    self.cancel_all_timers();
                    let _ = done.send(());
                    return;
                }
            }
        }

        self.cancel_all_timers();
        debug!("All event monitor handles dropped, actor stopped");
    }

    fn post(&mut self, event: Event) {
        info!("Posting event {}", event);

        let id = event.id();
        if self.queue.contains(id) {
            warn!("Event {} is already active, appending duplicate entry", id);
        }

        let event = Arc::new(event);
        let position = self.queue.insert(Arc::clone(&event));
        self.publish();
        debug!(
            "Event {} queued at position {} of {}",
            id,
            position,
            self.queue.len()
        );

        self.surface.expand();

        if event.auto_dismiss() {
            match event.dismiss_after() {
                Some(delay) => self.arm_timer(id, delay),
                None => warn!(
                    "Event '{}' requests auto-dismiss without a delay, no timer armed",
                    event.title()
                ),
            }
        }
    }

    fn arm_timer(&mut self, id: EventId, delay: Duration) {
        self.next_generation += 1;
        let generation = self.next_generation;
        let cancel = CancellationToken::new();

        let previous = self.timers.insert(
            id,
            ArmedTimer {
                generation,
                cancel: cancel.clone(),
            },
        );
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }

        debug!(
            "Armed dismiss timer for event {} ({:.1}s)",
            id,
            delay.as_secs_f64()
        );

        let commands = self.commands.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            if cancel.is_cancelled() {
                return;
            }
            // Upgrade fails once the monitor is gone
            if let Some(commands) = commands.upgrade() {
                let _ = commands.send(Command::TimerFired { id, generation });
            }
        });
    }

    async fn timer_fired(&mut self, id: EventId, generation: u64) {
        let current = self
            .timers
            .get(&id)
            .is_some_and(|timer| timer.generation == generation && !timer.cancel.is_cancelled());

        if current {
            info!("Auto-dismissing event {}", id);
            self.dismiss(id).await;
        } else {
            debug!("Ignoring stale dismiss timer for event {}", id);
        }
    }

    async fn dismiss(&mut self, id: EventId) {
        if let Some(timer) = self.timers.remove(&id) {
            timer.cancel.cancel();
            debug!("Cancelled dismiss timer for event {}", id);
        }

        if !self.queue.contains(id) {
            debug!("Event {} is not active, nothing to dismiss", id);
            return;
        }

        match self.policy {
            DismissPolicy::CompactFirst => {
                if self.queue.len() == 1 {
                    info!("Last event dismissed, compacting before removal");
                    self.surface.compact().await;
                }
                self.remove(id);
            }
            DismissPolicy::Immediate => {
                self.remove(id);
                if self.queue.is_empty() {
                    info!("No more events, compacting");
                    self.surface.compact().await;
                }
            }
        }
    }

    async fn dismiss_all(&mut self) {
        let cancelled = self.cancel_all_timers();
        if self.queue.is_empty() {
            debug!("Dismiss all with no active events ({} timers cancelled)", cancelled);
            return;
        }

        info!("Dismissing all {} events", self.queue.len());
        match self.policy {
            DismissPolicy::CompactFirst => {
                self.surface.compact().await;
                self.queue.clear();
                self.publish();
            }
            DismissPolicy::Immediate => {
                self.queue.clear();
                self.publish();
                self.surface.compact().await;
            }
        }
    }

    fn remove(&mut self, id: EventId) {
        if let Some(event) = self.queue.remove(id) {
            info!("Dismissed event '{}'", event.title());
            self.publish();
        }
    }

    fn cancel_all_timers(&mut self) -> usize {
        let count = self.timers.len();
        for (_, timer) in self.timers.drain() {
            timer.cancel.cancel();
        }
        count
    }

    fn publish(&self) {
        self.published.send_replace(self.queue.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;

    fn spawn_monitor(policy: DismissPolicy) -> (EventMonitor, RecordingSurface) {
        let surface = RecordingSurface::new();
        let monitor = EventMonitor::spawn(Arc::new(surface.clone()), policy);
        (monitor, surface)
    }

    #[tokio::test]
    async fn test_post_publishes_before_returning() {
        let (monitor, surface) = spawn_monitor(DismissPolicy::CompactFirst);
        let event = Event::alert("Disk almost full", None);
        let id = event.id();

        monitor.post_event(event).await;

        assert!(monitor.has_events());
        assert_eq!(monitor.current_event().map(|e| e.id()), Some(id));
        assert_eq!(surface.expand_count(), 1);
    }

    #[tokio::test]
    async fn test_dismiss_unknown_id_is_silent() {
        let (monitor, surface) = spawn_monitor(DismissPolicy::CompactFirst);

        monitor.dismiss_event(EventId::new()).await;

        assert!(!monitor.has_events());
        assert_eq!(surface.compact_count(), 0);
    }

    #[tokio::test]
    async fn test_immediate_policy_removes_before_compacting() {
        let (monitor, surface) = spawn_monitor(DismissPolicy::Immediate);
        let event = Event::alert("Unplugged", None);
        let id = event.id();
        monitor.post_event(event).await;

        surface.hold_compact();
        let dismissing = {
            let monitor = monitor.clone();
            tokio::spawn(async move { monitor.dismiss_event(id).await })
        };

        surface.compact_started().await;
        assert!(monitor.current_event().is_none());

        surface.release_compact();
        dismissing.await.unwrap();
        assert_eq!(surface.compact_count(), 1);
    }

    #[tokio::test]
    async fn test_calls_after_shutdown_are_noops() {
        let (monitor, surface) = spawn_monitor(DismissPolicy::CompactFirst);
        monitor.shutdown().await;

        monitor.post_event(Event::alert("late", None)).await;
        monitor.dismiss_all().await;

        assert!(!monitor.has_events());
        assert_eq!(surface.expand_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_id_replaces_timer() {
        let (monitor, _surface) = spawn_monitor(DismissPolicy::CompactFirst);
        let id = EventId::new();
        let first = Event::custom("first")
            .id(id)
            .dismiss_after(Some(Duration::from_secs(2)))
            .build();
        let second = Event::custom("second")
            .id(id)
            .dismiss_after(Some(Duration::from_secs(10)))
            .build();

        monitor.post_event(first).await;
        monitor.post_event(second).await;
        assert_eq!(monitor.active_events().len(), 2);

        // The 2s timer was replaced, nothing fires at 2s
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(monitor.active_events().len(), 2);

        // The 10s timer removes one entry only
        tokio::time::sleep(Duration::from_secs(8)).await;
        assert_eq!(monitor.active_events().len(), 1);
    }
}
