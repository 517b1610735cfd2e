use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{Level, debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

use crate::config::LoggingSettings;

const LOG_FILE_NAME: &str = "notchy.log";

/// Runtime logging setup, assembled from CLI flags and the `[logging]` section
pub struct LoggingConfig {
    pub level: Level,
    pub file_output: bool,
    pub console_output: bool,
    pub log_dir: Option<PathBuf>,
    pub json_format: bool,
}

impl LoggingConfig {
    pub fn from_settings(level: Level, settings: &LoggingSettings) -> Self {
        Self {
            level,
            file_output: settings.file_output,
            console_output: true,
            log_dir: settings.log_dir.clone(),
            json_format: settings.json_format,
        }
    }
}

/// Parse a `log_level` string, falling back to INFO on anything unknown
pub fn parse_level(value: &str) -> Level {
    value.trim().parse().unwrap_or(Level::INFO)
}

/// Filter directive scoping output to this crate; `RUST_LOG` wins when set
fn build_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("notchy={}", level.as_str().to_lowercase())))
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// One fmt layer; JSON always carries source locations, text only when
/// `locations` is set
fn fmt_layer<W>(writer: W, json: bool, ansi: bool, locations: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    if json {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_file(locations)
            .with_line_number(locations)
            .boxed()
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer and must be held for the life
/// of the process; the directory is returned when file output is on.
pub fn initialize_logging(config: LoggingConfig) -> Result<(Option<WorkerGuard>, Option<PathBuf>)> {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    if config.console_output {
        layers.push(fmt_layer(std::io::stdout, config.json_format, true, false));
    }

    let mut file_output = None;
    if config.file_output {
        let dir = match config.log_dir {
            Some(dir) => dir,
            None => get_default_log_dir()?,
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create log directory {}", dir.display()))?;

        let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_NAME);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        layers.push(fmt_layer(writer, config.json_format, false, true));
        file_output = Some((guard, dir));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(build_filter(config.level))
        .try_init()
        .context("Tracing subscriber already installed")?;

    Ok(file_output.map_or((None, None), |(guard, dir)| (Some(guard), Some(dir))))
}

/// `~/.local/share/notchy/logs`
pub fn get_default_log_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Home directory not found")?;
    Ok(home.join(".local").join("share").join("notchy").join("logs"))
}

/// Remove rotated log files last modified more than `keep_days` ago.
/// Returns the number removed; a missing directory removes nothing.
pub fn cleanup_old_logs(log_dir: &Path, keep_days: u64) -> Result<usize> {
    if !log_dir.is_dir() {
        return Ok(0);
    }

    let max_age = Duration::from_secs(keep_days * 24 * 60 * 60);
    let now = SystemTime::now();
    let expired = |modified: SystemTime| {
        now.duration_since(modified)
            .is_ok_and(|age| age > max_age)
    };

    let entries = std::fs::read_dir(log_dir)
        .with_context(|| format!("Cannot list log directory {}", log_dir.display()))?;

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || !is_rotated_log(&path) {
            continue;
        }
        let Ok(modified) = entry.metadata().and_then(|meta| meta.modified()) else {
            continue;
        };
        if !expired(modified) {
            continue;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed expired log {}", path.display());
                removed += 1;
            }
            Err(e) => warn!("Could not remove expired log {}: {}", path.display(), e),
        }
    }

    if removed > 0 {
        info!("Removed {} log file(s) older than {} days", removed, keep_days);
    }
    Ok(removed)
}

/// Daily rotation names files `notchy.log.YYYY-MM-DD`
fn is_rotated_log(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(LOG_FILE_NAME))
}
