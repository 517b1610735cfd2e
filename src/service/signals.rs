use anyhow::Result;
use signal_hook::consts::signal::*;
use signal_hook_tokio::Signals;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{info, warn};

/// Signal types that can be received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalType {
    /// SIGTERM or SIGINT
    Shutdown,
    /// SIGHUP
    Reload,
}

impl SignalType {
    pub fn from_raw(signal: i32) -> Option<Self> {
        match signal {
            SIGTERM | SIGINT => Some(SignalType::Shutdown),
            SIGHUP => Some(SignalType::Reload),
            _ => None,
        }
    }
}

/// Forwards process signals to the service loop as [`SignalType`]s
#[derive(Clone)]
pub struct SignalHandler {
    shutdown_flag: Arc<AtomicBool>,
    signal_sender: mpsc::UnboundedSender<SignalType>,
}

impl SignalHandler {
    pub fn new(signal_sender: mpsc::UnboundedSender<SignalType>) -> Self {
        Self {
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            signal_sender,
        }
    }

    /// Listen until a shutdown signal arrives or the receiver goes away
    pub async fn listen_for_signals(&self) -> Result<()> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGHUP])?;
        let handle = signals.handle();

        info!("Signal handler initialized, listening for SIGTERM, SIGINT, SIGHUP");

        while let Some(signal) = signals.next().await {
            let Some(kind) = SignalType::from_raw(signal) else {
                warn!("Received unexpected signal: {}", signal);
                continue;
            };

            match kind {
                SignalType::Shutdown => info!(
                    "Received shutdown signal ({}), initiating graceful shutdown",
                    signal
                ),
                SignalType::Reload => info!("Received SIGHUP signal, reloading configuration"),
            }

            if !self.forward(kind) || kind == SignalType::Shutdown {
                break;
            }
        }

        handle.close();
        Ok(())
    }

    /// Record and pass on a signal; false once nobody is listening
    pub fn forward(&self, kind: SignalType) -> bool {
        if kind == SignalType::Shutdown {
            self.shutdown_flag.store(true, Ordering::Relaxed);
        }

        if let Err(e) = self.signal_sender.send(kind) {
            warn!("Failed to forward {:?} signal: {}", kind, e);
            return false;
        }
        true
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag.load(Ordering::Relaxed)
    }
}
