//! Configuration for tpanel.
//!
//! Loaded from `~/.tpanel/config.toml`; a missing or unreadable file means
//! defaults.
//!
//! ```toml
//! # Key-read poll interval in milliseconds
//! poll_interval_ms = 100
//!
//! # Register colour pairs with the terminal
//! colour = true
//!
//! [window]
//! border_style = "single"   # single, double, rounded
//! cursor_visible = true
//!
//! [log]
//! level = "info"
//! file = "/tmp/tpanel.log"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::ui::glyphs::{BorderChars, BorderStyle};

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sleep between key polls in the blocking read
    pub poll_interval_ms: u64,
    /// Colour support (off forces monochrome output)
    pub colour: bool,
    pub window: WindowConfig,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            colour: true,
            window: WindowConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Window defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub border_style: BorderStyle,
    /// Initial cursor visibility of new windows
    pub cursor_visible: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            border_style: BorderStyle::Single,
            cursor_visible: true,
        }
    }
}

/// Logging settings (used by the binary)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. "info" or "tpanel=debug"
    pub level: String,
    /// Log file; defaults to `~/.tpanel/tpanel.log`
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load configuration from a file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()
            .ok_or_else(|| Error::Config("could not determine config path".to_string()))?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&path, content)?;
        Ok(path)
    }

    /// `~/.tpanel`
    pub fn config_dir() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".tpanel"))
    }

    /// `~/.tpanel/config.toml`
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Log file path, falling back to `~/.tpanel/tpanel.log`
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log
            .file
            .clone()
            .or_else(|| Self::config_dir().map(|dir| dir.join("tpanel.log")))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn border_chars(&self) -> BorderChars {
        BorderChars::for_style(self.window.border_style)
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
