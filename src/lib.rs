pub mod audio;
pub mod config;
pub mod events;
pub mod island;
pub mod logging;
pub mod monitor;
pub mod notifications;
pub mod orchestrator;
pub mod service;
pub mod sources;
pub mod surface;
pub mod system;

pub use config::{Config, ConfigLoader};
pub use events::{Event, EventId, EventKind};
pub use island::{IslandMode, IslandStateManager};
pub use monitor::{DismissPolicy, EventMonitor};
pub use orchestrator::{ContentOrchestrator, DisplayMode};
pub use surface::{ConsoleSurface, NotchSurface};

#[cfg(any(test, feature = "test-mocks"))]
pub use notifications::TestNotificationSender;
#[cfg(any(test, feature = "test-mocks"))]
pub use surface::{RecordingSurface, SurfaceCall};
#[cfg(any(test, feature = "test-mocks"))]
pub use system::{MockAudioDeviceSource, MockCpuSampler, MockFileSystem};
