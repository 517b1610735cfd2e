//! Event producers. Each runs as its own task, holds a cloned
//! [`EventMonitor`](crate::monitor::EventMonitor) handle and stops when its
//! cancellation token fires.

pub mod airpods;
pub mod cpu;
pub mod login;

pub use airpods::{AirPodsChange, AirPodsMonitor, AirPodsTracker};
pub use cpu::{CpuAlertDetector, CpuMonitor, CpuStats};
pub use login::{LoginMonitor, LoginState, WelcomeDecision};
