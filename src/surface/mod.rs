use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// Host window hooks driven by the event monitor.
///
/// The monitor holds no other reference to the on-screen surface.
#[async_trait]
pub trait NotchSurface: Send + Sync {
    /// At least one event is active; show/expand the surface. Fire-and-forget.
    fn expand(&self);

    /// No events remain; collapse back to ambient content.
    /// The monitor awaits this before finalising removal of the last event.
    async fn compact(&self);
}

/// Surface used by the daemon: logs hook invocations and simulates the
/// collapse animation with a fixed delay.
pub struct ConsoleSurface {
    compact_animation: Duration,
}

impl ConsoleSurface {
    pub fn new(compact_animation: Duration) -> Self {
        Self { compact_animation }
    }
}

impl Default for ConsoleSurface {
    fn default() -> Self {
        Self::new(Duration::from_millis(350))
    }
}

#[async_trait]
impl NotchSurface for ConsoleSurface {
    fn expand(&self) {
        info!("Notch expanding for active event");
    }

    async fn compact(&self) {
        info!("Notch compacting");
        if !self.compact_animation.is_zero() {
            tokio::time::sleep(self.compact_animation).await;
        }
        debug!("Compact animation finished");
    }
}

/// Hook call recorded by [`RecordingSurface`]
#[cfg(any(test, feature = "test-mocks"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceCall {
    Expand,
    CompactStarted,
    CompactFinished,
}

/// Test surface that records hook calls and can hold `compact` open until
/// the test releases it.
#[cfg(any(test, feature = "test-mocks"))]
#[derive(Clone, Default)]
pub struct RecordingSurface {
    calls: std::sync::Arc<std::sync::Mutex<Vec<SurfaceCall>>>,
    gate: std::sync::Arc<std::sync::Mutex<Option<std::sync::Arc<tokio::sync::Semaphore>>>>,
    compact_started: std::sync::Arc<tokio::sync::Notify>,
}

#[cfg(any(test, feature = "test-mocks"))]
impl RecordingSurface {
    #[allow(dead_code)] // Used by integration tests which run in different compilation context
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `compact` wait for [`RecordingSurface::release_compact`]
    #[allow(dead_code)]
    pub fn hold_compact(&self) {
        *self.gate.lock().unwrap() = Some(std::sync::Arc::new(tokio::sync::Semaphore::new(0)));
    }

    /// Let one held `compact` call finish
    #[allow(dead_code)]
    pub fn release_compact(&self) {
        if let Some(gate) = self.gate.lock().unwrap().as_ref() {
            gate.add_permits(1);
        }
    }

    /// Resolves once a `compact` call has started
    #[allow(dead_code)]
    pub async fn compact_started(&self) {
        self.compact_started.notified().await;
    }

    #[allow(dead_code)]
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn expand_count(&self) -> usize {
        self.count(SurfaceCall::Expand)
    }

    #[allow(dead_code)]
    pub fn compact_count(&self) -> usize {
        self.count(SurfaceCall::CompactStarted)
    }

    #[allow(dead_code)]
    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn count(&self, call: SurfaceCall) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|recorded| **recorded == call)
            .count()
    }
}

#[cfg(any(test, feature = "test-mocks"))]
#[async_trait]
impl NotchSurface for RecordingSurface {
    fn expand(&self) {
        self.calls.lock().unwrap().push(SurfaceCall::Expand);
    }

    async fn compact(&self) {
        self.calls.lock().unwrap().push(SurfaceCall::CompactStarted);
        self.compact_started.notify_one();

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        self.calls.lock().unwrap().push(SurfaceCall::CompactFinished);
    }
}
