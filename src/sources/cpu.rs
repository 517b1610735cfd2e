use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::CpuConfig;
use crate::events::Event;
use crate::monitor::EventMonitor;
use crate::system::CpuSampler;

const MAX_HISTORY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuStats {
    pub current_usage: f64,
    pub high_readings: usize,
    /// Span between the first and the last high reading in history
    pub high_span: Duration,
}

/// Sustained-usage detection over a bounded reading history
#[derive(Debug)]
pub struct CpuAlertDetector {
    threshold: f64,
    min_sustained: Duration,
    cooldown: Duration,
    history: VecDeque<(f64, Instant)>,
    last_alert: Option<Instant>,
}

impl CpuAlertDetector {
    pub fn new(config: &CpuConfig) -> Self {
        Self {
            threshold: config.threshold,
            min_sustained: config.min_sustained(),
            cooldown: config.alert_cooldown(),
            history: VecDeque::with_capacity(MAX_HISTORY),
            last_alert: None,
        }
    }

    /// Record a reading; true when it should raise an alert
    pub fn record(&mut self, usage: f64, at: Instant) -> bool {
        self.history.push_back((usage, at));
        if self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }

        if usage <= self.threshold {
            return false;
        }

        let Some(sustained) = self.sustained_for(at) else {
            return false;
        };

        if sustained < self.min_sustained {
            debug!(
                "CPU high ({:.0}%) for {:?}, waiting for {:?}",
                usage, sustained, self.min_sustained
            );
            return false;
        }

        if let Some(last_alert) = self.last_alert {
            let since = at.saturating_duration_since(last_alert);
            if since < self.cooldown {
                debug!("CPU high ({:.0}%) but alert on cooldown ({:?})", usage, since);
                return false;
            }
        }

        self.last_alert = Some(at);
        true
    }

    /// How long the current run of high readings has lasted at `now`
    fn sustained_for(&self, now: Instant) -> Option<Duration> {
        let start = self
            .history
            .iter()
            .rev()
            .take_while(|(reading, _)| *reading > self.threshold)
            .last()
            .map(|(_, time)| *time)?;
        Some(now.saturating_duration_since(start))
    }

    pub fn stats(&self) -> CpuStats {
        let Some(&(current_usage, _)) = self.history.back() else {
            return CpuStats {
                current_usage: 0.0,
                high_readings: 0,
                high_span: Duration::ZERO,
            };
        };

        let high: Vec<Instant> = self
            .history
            .iter()
            .filter(|(reading, _)| *reading > self.threshold)
            .map(|(_, time)| *time)
            .collect();

        let high_span = match (high.first(), high.last()) {
            (Some(first), Some(last)) => last.saturating_duration_since(*first),
            _ => Duration::ZERO,
        };

        CpuStats {
            current_usage,
            high_readings: high.len(),
            high_span,
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

/// Periodic CPU sampling that posts an alert on sustained high usage
pub struct CpuMonitor<S: CpuSampler + 'static> {
    sampler: Arc<S>,
    detector: CpuAlertDetector,
    interval: Duration,
    threshold: f64,
}

impl<S: CpuSampler + 'static> CpuMonitor<S> {
    pub fn new(sampler: S, config: &CpuConfig) -> Self {
        info!(
            "CPU monitor initialized (threshold: {}%, interval: {}s, sustained: {}s)",
            config.threshold, config.check_interval_secs, config.min_sustained_secs
        );
        Self {
            sampler: Arc::new(sampler),
            detector: CpuAlertDetector::new(config),
            interval: config.check_interval(),
            threshold: config.threshold,
        }
    }

    /// Sample until cancelled. The first sample is taken immediately.
    pub async fn run(mut self, monitor: EventMonitor, cancel: CancellationToken) {
        info!("CPU monitoring started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let Some(usage) = self.sample().await else {
                continue;
            };

            debug!("CPU usage: {:.1}% (threshold: {}%)", usage, self.threshold);
            if self.detector.record(usage, Instant::now()) {
                info!("CPU above threshold for required duration ({:.0}%), posting alert", usage);
                monitor.post_event(Event::cpu_alert(usage)).await;
            }
        }

        self.detector.reset();
        info!("CPU monitoring stopped");
    }

    async fn sample(&self) -> Option<f64> {
        let sampler = Arc::clone(&self.sampler);
        match tokio::task::spawn_blocking(move || sampler.sample_cpu_usage()).await {
            Ok(Ok(usage)) => Some(usage),
            Ok(Err(e)) => {
                warn!("Failed to sample CPU usage: {:#}", e);
                None
            }
            Err(e) => {
                warn!("CPU sampling task failed: {}", e);
                None
            }
        }
    }

    pub fn stats(&self) -> CpuStats {
        self.detector.stats()
    }
}
