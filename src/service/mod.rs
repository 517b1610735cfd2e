pub mod daemon;
pub mod runtime;
pub mod signals;

pub use daemon::{ProductionService, ServiceManager};
pub use runtime::{NotchyService, ServiceDeps};
pub use signals::{SignalHandler, SignalType};
