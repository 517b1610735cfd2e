use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::runtime::{NotchyService, ServiceDeps};
use super::signals::{SignalHandler, SignalType};
use crate::notifications::MacOSNotificationSender;
use crate::surface::{ConsoleSurface, NotchSurface};
use crate::system::{CoreAudioDeviceSource, StandardFileSystem, TopCpuSampler, full_user_name};

pub type ProductionService =
    NotchyService<StandardFileSystem, CoreAudioDeviceSource, TopCpuSampler, MacOSNotificationSender>;

/// Manages the background service lifecycle
pub struct ServiceManager {
    service: ProductionService,
}

impl ServiceManager {
    /// Production service rendering to the console surface
    pub fn new(config_path: PathBuf) -> Result<Self> {
        let deps = ServiceDeps {
            file_system: StandardFileSystem,
            audio: CoreAudioDeviceSource,
            cpu: TopCpuSampler,
            notifier: MacOSNotificationSender,
            user_name: full_user_name(),
        };

        let service = NotchyService::new(deps, config_path, |config| {
            let surface: Arc<dyn NotchSurface> =
                Arc::new(ConsoleSurface::new(config.events.compact_animation()));
            surface
        })?;
        Ok(Self { service })
    }

    /// Run until SIGTERM/SIGINT; SIGHUP reloads the configuration
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting Notchy service");

        let (signal_tx, mut signal_rx) = mpsc::unbounded_channel::<SignalType>();
        let signal_handler = SignalHandler::new(signal_tx);

        let listener = tokio::spawn(async move {
            if let Err(e) = signal_handler.listen_for_signals().await {
                error!("Signal handler error: {}", e);
            }
        });

        self.service.start()?;

        info!("Service started successfully, entering main loop");

        loop {
            match signal_rx.recv().await {
                Some(SignalType::Shutdown) => {
                    info!("Shutdown signal received, stopping service");
                    break;
                }
                Some(SignalType::Reload) => {
                    if let Err(e) = self.service.reload().await {
                        warn!("Reload failed, previous configuration kept: {:#}", e);
                    }
                }
                None => {
                    warn!("Signal channel closed");
                    break;
                }
            }
        }

        self.service.shutdown().await;
        listener.abort();
        Ok(())
    }

    pub fn service(&self) -> &ProductionService {
        &self.service
    }
}
