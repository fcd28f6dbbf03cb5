// ABOUTME: Configuration types and parsing for config.yaml.
// ABOUTME: Handles YAML parsing, defaulting, validation, and create-or-read.

mod docker;
mod init;
mod repository;
mod shared;
mod target;
mod watcher;

pub use docker::{DEFAULT_DOCKER_ENDPOINT, DockerConfig, TlsConfig};
pub use init::init_config;
pub use repository::RemoteRepository;
pub use shared::{ConfigSnapshot, SharedConfig};
pub use target::TargetImage;
pub use watcher::ConfigWatcher;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "config.yaml";
pub const DEFAULT_HOME_DIR: &str = "/etc/imagesync";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    #[serde(default)]
    pub docker_config: DockerConfig,

    /// The local repository images are pushed into.
    #[serde(default)]
    pub repo: RemoteRepository,

    /// Pull sources, probed in declared order.
    #[serde(default)]
    pub remote_repos: Vec<RemoteRepository>,

    #[serde(default)]
    pub images: Vec<TargetImage>,

    /// Interval between unprompted rechecks. `null` disables them.
    #[serde(default = "default_resync_interval", with = "humantime_serde")]
    pub resync_interval: Option<Duration>,

    #[serde(default = "default_watch_debounce", with = "humantime_serde")]
    pub watch_debounce: Duration,
}

fn default_resync_interval() -> Option<Duration> {
    Some(Duration::from_secs(600))
}

fn default_watch_debounce() -> Duration {
    Duration::from_secs(1)
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            docker_config: DockerConfig::default(),
            repo: RemoteRepository::default(),
            remote_repos: Vec::new(),
            images: Vec::new(),
            resync_interval: default_resync_interval(),
            watch_debounce: default_watch_debounce(),
        }
    }
}

impl SyncConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(Error::from)
    }

    /// Read, parse and default-fill the config at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        config.fill_with_defaults();
        tracing::info!(path = %path.display(), "read config");
        Ok(config)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        tracing::info!(path = %path.display(), "writing config");
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// Load the config at `path`, writing a defaulted one first if it is missing.
    ///
    /// Returns the config and whether it was freshly created.
    pub fn create_or_read(path: &Path) -> Result<(Self, bool)> {
        if path.exists() {
            return Self::load(path).map(|c| (c, false));
        }

        tracing::info!(path = %path.display(), "writing default config");
        let mut config = SyncConfig::default();
        config.fill_with_defaults();
        config.write(path)?;
        Ok((config, true))
    }

    pub fn fill_with_defaults(&mut self) {
        self.docker_config.fill_with_defaults();
    }

    pub fn validate(&self) -> Result<()> {
        self.docker_config.validate()?;

        // The local repository only matters once there is something to sync.
        if !self.remote_repos.is_empty() || !self.images.is_empty() {
            self.repo
                .validate()
                .map_err(|e| Error::InvalidConfig(format!("repo: {}", e)))?;
        }

        for (idx, remote) in self.remote_repos.iter().enumerate() {
            remote
                .validate()
                .map_err(|e| Error::InvalidConfig(format!("remoteRepos[{}]: {}", idx, e)))?;
        }

        for (idx, target) in self.images.iter().enumerate() {
            if target.image.trim().is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "images[{}]: image name cannot be empty",
                    idx
                )));
            }
        }

        Ok(())
    }
}

/// Resolve the home directory, falling back to [`DEFAULT_HOME_DIR`].
pub fn resolve_home(home: Option<&Path>) -> Result<PathBuf> {
    match home {
        Some(dir) if !dir.as_os_str().is_empty() => {
            if dir.is_absolute() {
                Ok(dir.to_path_buf())
            } else {
                Ok(std::env::current_dir()?.join(dir))
            }
        }
        _ => Ok(PathBuf::from(DEFAULT_HOME_DIR)),
    }
}

pub fn config_path(home: &Path) -> PathBuf {
    home.join(CONFIG_FILENAME)
}
