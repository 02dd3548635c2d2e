use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_VERSION: u64 = 1;

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("vtasks")
}

fn default_data_file() -> PathBuf {
    default_data_dir().join("entries.json")
}

fn default_wake_interval_secs() -> u64 {
    60
}

fn default_highlight_secs() -> u64 {
    2
}

fn default_true() -> bool {
    true
}

fn default_version() -> u64 {
    CONFIG_VERSION
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct VtasksConfig {
    #[serde(default = "default_version")]
    pub version: u64,
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    #[serde(default = "default_wake_interval_secs")]
    pub wake_interval_secs: u64,
    #[serde(default = "default_highlight_secs")]
    pub highlight_secs: u64,
    #[serde(default = "default_true")]
    pub notifications: bool,
    #[serde(default)]
    pub debug_logging: bool,
}

impl Default for VtasksConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            data_file: default_data_file(),
            wake_interval_secs: default_wake_interval_secs(),
            highlight_secs: default_highlight_secs(),
            notifications: true,
            debug_logging: false,
        }
    }
}

impl VtasksConfig {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("vtasks")
            .join("config.json")
    }

    /// Missing file gives defaults; so does a malformed one, with a warning.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                log::warn!("Failed to read config {}: {}", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(config) => {
                if config.version > CONFIG_VERSION {
                    log::warn!(
                        "Config {} has newer version {}, reading what we understand",
                        path.display(),
                        config.version
                    );
                }
                config
            }
            Err(e) => {
                log::warn!("Ignoring malformed config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Never zero; a zero-length interval would spin.
    pub fn wake_interval(&self) -> Duration {
        Duration::from_secs(self.wake_interval_secs.max(1))
    }

    pub fn highlight_duration(&self) -> Duration {
        Duration::from_secs(self.highlight_secs)
    }
}
