use anyhow::Result;
use std::path::Path;

/// Trait for file system operations - abstracts std::fs for testability
pub trait FileSystemInterface {
    /// Read the entire contents of a file
    fn read_file(&self, path: &Path) -> Result<String>;

    /// Write content to a file, replacing it
    fn write_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Check if a file exists
    fn file_exists(&self, path: &Path) -> bool;

    /// Create a directory and its parents
    fn create_dir(&self, path: &Path) -> Result<()>;

    /// Get the last modified time of a file
    fn get_modified_time(&self, path: &Path) -> Result<std::time::SystemTime>;
}

/// Source of currently attached audio output device names
pub trait AudioDeviceSource: Send + Sync {
    fn output_device_names(&self) -> Result<Vec<String>>;
}

/// One-shot sampler of total CPU usage in percent (user + system).
///
/// Implementations may block; callers run them off the async workers.
pub trait CpuSampler: Send + Sync {
    fn sample_cpu_usage(&self) -> Result<f64>;
}
