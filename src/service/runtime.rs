use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{Config, ConfigLoader};
use crate::monitor::EventMonitor;
use crate::notifications::{EventPresenter, NotificationManager, NotificationSender};
use crate::orchestrator::ContentOrchestrator;
use crate::sources::{AirPodsMonitor, CpuMonitor, LoginMonitor};
use crate::surface::NotchSurface;
use crate::system::{AudioDeviceSource, CpuSampler, FileSystemInterface};

/// Injected I/O for the service, so it runs the same against mocks
#[derive(Clone)]
pub struct ServiceDeps<F, A, C, N> {
    pub file_system: F,
    pub audio: A,
    pub cpu: C,
    pub notifier: N,
    pub user_name: String,
}

/// Tasks started from one configuration, stopped together
struct TaskSet {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl TaskSet {
    async fn stop(self) {
        self.cancel.cancel();
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!("Producer task ended abnormally: {}", e);
            }
        }
    }
}

/// Event monitor, orchestrator, presenter and producers wired together.
///
/// The monitor (and its queue) lives as long as the service; producers and
/// the presenter are restarted whenever the configuration is reloaded.
pub struct NotchyService<F, A, C, N>
where
    F: FileSystemInterface + Clone + Send + Sync + 'static,
    A: AudioDeviceSource + Clone + 'static,
    C: CpuSampler + Clone + 'static,
    N: NotificationSender + Clone + 'static,
{
    deps: ServiceDeps<F, A, C, N>,
    config_loader: ConfigLoader<F>,
    config: Config,
    monitor: EventMonitor,
    orchestrator: ContentOrchestrator,
    tasks: Option<TaskSet>,
}

impl<F, A, C, N> NotchyService<F, A, C, N>
where
    F: FileSystemInterface + Clone + Send + Sync + 'static,
    A: AudioDeviceSource + Clone + 'static,
    C: CpuSampler + Clone + 'static,
    N: NotificationSender + Clone + 'static,
{
    /// Load the configuration and spawn the event monitor on the surface
    /// built from it. Must be called inside a tokio runtime.
    pub fn new(
        deps: ServiceDeps<F, A, C, N>,
        config_path: PathBuf,
        make_surface: impl FnOnce(&Config) -> Arc<dyn NotchSurface>,
    ) -> Result<Self> {
        let config_loader = ConfigLoader::new(deps.file_system.clone(), config_path);
        let config = config_loader.load_config()?;

        let surface = make_surface(&config);
        let monitor = EventMonitor::spawn(surface, config.events.dismiss_policy);
        let orchestrator = ContentOrchestrator::new(monitor.clone());

        Ok(Self {
            deps,
            config_loader,
            config,
            monitor,
            orchestrator,
            tasks: None,
        })
    }

    /// Start the presenter and every enabled producer
    pub fn start(&mut self) -> Result<()> {
        if self.tasks.is_some() {
            warn!("Service already started");
            return Ok(());
        }

        // Fallible setup goes first so an error leaves nothing spawned
        let login = if self.config.login.enabled {
            Some(self.login_monitor()?)
        } else {
            None
        };

        let cancel = CancellationToken::new();
        let mut handles = Vec::new();

        let notifications =
            NotificationManager::with_sender(&self.config.notifications, self.deps.notifier.clone());
        let presenter = EventPresenter::new(self.orchestrator.clone(), notifications);
        handles.push(tokio::spawn(presenter.run(cancel.child_token())));

        if self.config.cpu.enabled {
            let cpu = CpuMonitor::new(self.deps.cpu.clone(), &self.config.cpu);
            handles.push(tokio::spawn(
                cpu.run(self.monitor.clone(), cancel.child_token()),
            ));
        }

        if self.config.airpods.enabled {
            let airpods = AirPodsMonitor::new(self.deps.audio.clone(), &self.config.airpods);
            handles.push(tokio::spawn(
                airpods.run(self.monitor.clone(), cancel.child_token()),
            ));
        }

        if let Some(login) = login {
            handles.push(tokio::spawn(
                login.run(self.monitor.clone(), cancel.child_token()),
            ));
        }

        info!("Started {} service task(s)", handles.len());
        self.tasks = Some(TaskSet { cancel, handles });
        Ok(())
    }

    /// Stop producers and presenter; the event queue is left intact
    pub async fn stop(&mut self) {
        if let Some(tasks) = self.tasks.take() {
            tasks.stop().await;
            info!("Service tasks stopped");
        }
    }

    /// Re-read the configuration and restart producers with it.
    ///
    /// On a load error the previous configuration keeps running.
    pub async fn reload(&mut self) -> Result<()> {
        info!("Reloading configuration");

        let new_config = match self.config_loader.load_config() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to reload configuration, keeping current: {:#}", e);
                return Err(e);
            }
        };

        if new_config.events.dismiss_policy != self.config.events.dismiss_policy {
            warn!(
                "dismiss_policy changed to {:?}; takes effect on restart",
                new_config.events.dismiss_policy
            );
        }

        self.stop().await;
        let previous = std::mem::replace(&mut self.config, new_config);
        if let Err(e) = self.start() {
            error!("Cannot start with reloaded configuration, restoring previous: {:#}", e);
            self.config = previous;
            self.start()?;
            return Err(e);
        }

        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Stop everything, including the event monitor
    pub async fn shutdown(&mut self) {
        info!("Shutting down Notchy service");
        self.stop().await;
        self.monitor.shutdown().await;
        info!("Service shutdown completed");
    }

    /// Login monitor for the current configuration, with its state
    /// directory in place
    pub fn login_monitor(&self) -> Result<LoginMonitor<F>> {
        let state_path = self.config.login.state_path()?;
        if let Some(parent) = state_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.deps.file_system.create_dir(parent).with_context(|| {
                format!("Cannot create login state directory {}", parent.display())
            })?;
        }
        Ok(LoginMonitor::new(
            self.deps.file_system.clone(),
            &self.config.login,
            state_path,
            self.deps.user_name.clone(),
        ))
    }

    pub fn is_running(&self) -> bool {
        self.tasks.is_some()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn monitor(&self) -> &EventMonitor {
        &self.monitor
    }

    pub fn orchestrator(&self) -> &ContentOrchestrator {
        &self.orchestrator
    }

    pub fn config_loader(&self) -> &ConfigLoader<F> {
        &self.config_loader
    }
}
