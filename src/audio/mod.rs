#[cfg(target_os = "macos")]
mod coreaudio;

use anyhow::Result;

/// Names of every audio device that exposes output streams
#[cfg(target_os = "macos")]
pub fn output_device_names() -> Result<Vec<String>> {
    coreaudio::output_device_names()
}

#[cfg(not(target_os = "macos"))]
pub fn output_device_names() -> Result<Vec<String>> {
    tracing::debug!("CoreAudio is unavailable on this platform, reporting no devices");
    Ok(Vec::new())
}

/// True if `device_name` contains any of the configured AirPods names
pub fn is_airpods_device(device_name: &str, known_names: &[String]) -> bool {
    known_names
        .iter()
        .any(|known| !known.is_empty() && device_name.contains(known.as_str()))
}
