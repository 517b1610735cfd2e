use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::audio::is_airpods_device;
use crate::config::AirPodsConfig;
use crate::events::Event;
use crate::monitor::EventMonitor;
use crate::system::AudioDeviceSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AirPodsChange {
    Connected(String),
    Disconnected(String),
}

impl AirPodsChange {
    pub fn into_event(self) -> Event {
        match self {
            AirPodsChange::Connected(name) => Event::airpods_connected(name, None, None),
            AirPodsChange::Disconnected(name) => Event::airpods_disconnected(name, None, None),
        }
    }
}

/// Set of connected AirPods, diffed against each enumeration
#[derive(Debug)]
pub struct AirPodsTracker {
    known_names: Vec<String>,
    // None until the first enumeration primes it
    connected: Option<BTreeSet<String>>,
}

impl AirPodsTracker {
    pub fn new(known_names: Vec<String>) -> Self {
        Self {
            known_names,
            connected: None,
        }
    }

    /// Diff the currently attached output devices against the last poll.
    /// The first call only records what is present.
    pub fn reconcile(&mut self, device_names: &[String]) -> Vec<AirPodsChange> {
        let current: BTreeSet<String> = device_names
            .iter()
            .filter(|name| is_airpods_device(name, &self.known_names))
            .cloned()
            .collect();

        let Some(previous) = self.connected.replace(current.clone()) else {
            debug!("Primed AirPods set with {} device(s)", current.len());
            return Vec::new();
        };

        let connected = current
            .difference(&previous)
            .cloned()
            .map(AirPodsChange::Connected);
        let disconnected = previous
            .difference(&current)
            .cloned()
            .map(AirPodsChange::Disconnected);

        connected.chain(disconnected).collect()
    }

    pub fn connected(&self) -> impl Iterator<Item = &str> {
        self.connected.iter().flatten().map(String::as_str)
    }
}

/// Polls output devices and posts connect/disconnect events
pub struct AirPodsMonitor<S: AudioDeviceSource + 'static> {
    source: Arc<S>,
    tracker: AirPodsTracker,
    interval: Duration,
}

impl<S: AudioDeviceSource + 'static> AirPodsMonitor<S> {
    pub fn new(source: S, config: &AirPodsConfig) -> Self {
        Self {
            source: Arc::new(source),
            tracker: AirPodsTracker::new(config.device_names.clone()),
            interval: config.poll_interval(),
        }
    }

    pub async fn run(mut self, monitor: EventMonitor, cancel: CancellationToken) {
        info!("AirPods monitoring started (every {:?})", self.interval);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let Some(names) = self.enumerate().await else {
                continue;
            };

            for change in self.tracker.reconcile(&names) {
                match &change {
                    AirPodsChange::Connected(name) => info!("AirPods connected: {}", name),
                    AirPodsChange::Disconnected(name) => info!("AirPods disconnected: {}", name),
                }
                monitor.post_event(change.into_event()).await;
            }
        }

        info!("AirPods monitoring stopped");
    }

    async fn enumerate(&self) -> Option<Vec<String>> {
        let source = Arc::clone(&self.source);
        match tokio::task::spawn_blocking(move || source.output_device_names()).await {
            Ok(Ok(names)) => Some(names),
            Ok(Err(e)) => {
                warn!("Failed to enumerate audio devices: {:#}", e);
                None
            }
            Err(e) => {
                warn!("Audio enumeration task failed: {}", e);
                None
            }
        }
    }
}
