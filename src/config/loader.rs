use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

use crate::system::{FileSystemInterface, StandardFileSystem};

use super::types::Config;

const HEADER: &str = "# Notchy configuration. Every section is optional; \
missing keys fall back to their defaults.\n\n";

/// Reads and writes `config.toml` through a [`FileSystemInterface`]
pub struct ConfigLoader<F: FileSystemInterface> {
    file_system: F,
    config_path: PathBuf,
}

impl<F: FileSystemInterface> ConfigLoader<F> {
    pub fn new(file_system: F, config_path: PathBuf) -> Self {
        Self {
            file_system,
            config_path,
        }
    }

    /// Parsed and validated configuration. A missing file is replaced by the
    /// defaults, which are written out when possible.
    pub fn load_config(&self) -> Result<Config> {
        let path = self.config_path.as_path();
        if !self.file_system.file_exists(path) {
            info!("No configuration at {}, using defaults", path.display());
            return Ok(self.write_defaults());
        }

        debug!("Reading configuration from {}", path.display());
        let text = self
            .file_system
            .read_file(path)
            .with_context(|| format!("Cannot read config {}", path.display()))?;
        let config = parse(&text).with_context(|| format!("Invalid config {}", path.display()))?;

        debug!(
            "Configuration loaded (policy {:?}, cpu {}, login {}, airpods {})",
            config.events.dismiss_policy,
            config.cpu.enabled,
            config.login.enabled,
            config.airpods.enabled
        );
        Ok(config)
    }

    pub fn save_config(&self, config: &Config) -> Result<()> {
        let path = self.config_path.as_path();
        if let Some(dir) = path.parent() {
            self.file_system
                .create_dir(dir)
                .with_context(|| format!("Cannot create config directory {}", dir.display()))?;
        }

        let body = toml::to_string_pretty(config).context("Cannot serialize configuration")?;
        self.file_system
            .write_file(path, &format!("{HEADER}{body}"))
            .with_context(|| format!("Cannot write config {}", path.display()))?;

        info!("Configuration written to {}", path.display());
        Ok(())
    }

    /// True when the file changed after `since`; false while it does not exist
    pub fn is_config_modified(&self, since: SystemTime) -> Result<bool> {
        if !self.config_exists() {
            return Ok(false);
        }
        let modified = self.file_system.get_modified_time(&self.config_path)?;
        Ok(modified > since)
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn config_exists(&self) -> bool {
        self.file_system.file_exists(&self.config_path)
    }

    fn write_defaults(&self) -> Config {
        let config = Config::default();
        if let Err(e) = self.save_config(&config) {
            warn!("Default configuration not saved: {:#}", e);
        }
        config
    }
}

fn parse(text: &str) -> Result<Config> {
    let config: Config = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

impl ConfigLoader<StandardFileSystem> {
    pub fn new_production(config_path: PathBuf) -> Self {
        Self::new(StandardFileSystem, config_path)
    }

    /// Loader for `path`, or for [`Self::default_config_path`] when `None`
    pub fn for_path(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_config_path()?,
        };
        Ok(Self::new_production(config_path))
    }

    /// `~/.config/notchy/config.toml`
    pub fn default_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Home directory not found")?;
        Ok(home.join(".config").join("notchy").join("config.toml"))
    }
}
