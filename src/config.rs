//! # Configuration Management
//!
//! Loads `tide-config.toml`: which station's bulletin to fetch, how long a
//! fetched bulletin stays fresh, and how the development output is laid out.
//! A missing or invalid file is not an error; the defaults (Tokyo, daily
//! refresh, 7-day window) are used instead.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "tide-config.toml";

/// Application configuration loaded from tide-config.toml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Bulletin station configuration
    pub station: StationConfig,
    /// Bulletin cache configuration
    pub cache: CacheConfig,
    /// Display configuration
    pub display: DisplayConfig,
}

/// Tide bulletin station configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StationConfig {
    /// Two-character station code as printed in the bulletin (e.g. "TK")
    pub code: String,
    /// Human-readable station name for reference
    pub name: String,
    /// Bulletin URL with `{year}` and `{station}` placeholders
    pub bulletin_url: String,
}

/// Where fetched bulletins are kept and for how long
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Directory for cached bulletin files
    pub dir: PathBuf,
    /// Hours before a cached bulletin is fetched again
    pub ttl_hours: u64,
}

/// Display configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Number of days shown, starting today
    pub window_days: usize,
    /// Spacing of curve samples in minutes
    pub curve_step_minutes: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            station: StationConfig {
                code: "TK".to_string(),
                name: "Tokyo".to_string(),
                bulletin_url:
                    "https://www.data.jma.go.jp/kaiyou/data/db/tide/suisan/txt/{year}/{station}.txt"
                        .to_string(),
            },
            cache: CacheConfig {
                dir: PathBuf::from("/tmp/tide-bulletins"),
                ttl_hours: 24,
            },
            display: DisplayConfig {
                window_days: 7,
                curve_step_minutes: 10,
            },
        }
    }
}

impl StationConfig {
    /// Bulletin URL for `year`.
    pub fn bulletin_url_for(&self, year: i32) -> String {
        self.bulletin_url
            .replace("{year}", &year.to_string())
            .replace("{station}", &self.code)
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_hours * 3600)
    }
}

impl Config {
    /// Load configuration from tide-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(station = %config.station.name, "loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), "invalid config file format: {e}");
                    Self::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Write this configuration as TOML to `path`
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}
