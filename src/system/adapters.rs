use anyhow::{Context, Result};
use std::ffi::CStr;
use std::path::Path;
use std::process::Command;
use tracing::debug;

use crate::system::traits::{AudioDeviceSource, CpuSampler, FileSystemInterface};

/// Production implementation of FileSystemInterface using std::fs
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFileSystem;

impl FileSystemInterface for StandardFileSystem {
    fn read_file(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write file: {}", path.display()))
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))
    }

    fn get_modified_time(&self, path: &Path) -> Result<std::time::SystemTime> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to get file metadata: {}", path.display()))?;
        metadata
            .modified()
            .with_context(|| format!("Failed to get modified time: {}", path.display()))
    }
}

/// Production implementation of AudioDeviceSource using CoreAudio
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreAudioDeviceSource;

impl AudioDeviceSource for CoreAudioDeviceSource {
    fn output_device_names(&self) -> Result<Vec<String>> {
        crate::audio::output_device_names()
    }
}

/// Samples CPU usage by running `top` once
#[derive(Debug, Clone, Copy, Default)]
pub struct TopCpuSampler;

impl CpuSampler for TopCpuSampler {
    fn sample_cpu_usage(&self) -> Result<f64> {
        let output = Command::new("/bin/sh")
            .args(["-c", "top -l 1 -s 0 -n 0 | grep 'CPU usage'"])
            .output()
            .context("Failed to run top")?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!("top output: {}", stdout.trim());
        Ok(parse_top_cpu_usage(&stdout))
    }
}

/// Sum the user and sys percentages of a line like
/// `CPU usage: 15.5% user, 8.2% sys, 76.3% idle`. Unparseable parts count as 0.
pub fn parse_top_cpu_usage(output: &str) -> f64 {
    output
        .split(',')
        .map(str::trim)
        .filter(|part| part.contains("user") || part.contains("sys"))
        .filter_map(|part| {
            let before_percent = part.split('%').next()?;
            before_percent.split_whitespace().last()?.parse::<f64>().ok()
        })
        .sum()
}

/// Display name of the current user: passwd full name, then login name
pub fn full_user_name() -> String {
    passwd_full_name()
        .or_else(|| std::env::var("USER").ok().filter(|name| !name.is_empty()))
        .unwrap_or_else(|| "there".to_string())
}

fn passwd_full_name() -> Option<String> {
    // SAFETY: getpwuid returns a pointer into static storage owned by libc;
    // the fields are copied out before any other passwd call can run here.
    unsafe {
        let entry = libc::getpwuid(libc::getuid());
        if entry.is_null() || (*entry).pw_gecos.is_null() {
            return None;
        }
        let gecos = CStr::from_ptr((*entry).pw_gecos).to_string_lossy();
        // GECOS is comma-separated; the first field is the full name
        let full_name = gecos.split(',').next().unwrap_or_default().trim();
        if full_name.is_empty() {
            None
        } else {
            Some(full_name.to_string())
        }
    }
}
