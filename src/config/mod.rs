pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{
    AirPodsConfig, Config, CpuConfig, EventsConfig, GeneralConfig, LoggingSettings, LoginConfig,
    NotificationConfig,
};
