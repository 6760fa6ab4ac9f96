// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::playback::{MAX_SPEED, MIN_SPEED};

const APP_DIR: &str = "upodcatcher";
const CONFIG_FILENAME: &str = "upodcatcher.conf";
const DATABASE_FILENAME: &str = "feeds.db";
const PODCASTS_DIRNAME: &str = "podcasts";

/// Fraction of the duration at which an episode counts as listened.
pub const DEFAULT_LISTENED_THRESHOLD: f64 = 1.0;

/// Automatic retries granted to a failing transfer before it is dropped.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Application configuration, resolved once at startup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base directory for application data
    pub data_dir: PathBuf,
    /// Where downloaded episodes are stored
    pub podcasts_dir: PathBuf,
    /// SQLite database file
    pub database: PathBuf,
    /// position / duration ratio that marks an episode as listened
    pub listened_threshold: f64,
    /// Retry bound for failed transfers
    pub max_retries: u32,
    /// Interval of the position sampling timer
    pub sample_interval_secs: u64,
    /// Initial playback rate
    pub speed: f64,
    /// Initial playback gain (1.0 = unchanged)
    pub volume: f64,
    /// Start the next playable episode when one ends
    pub auto_advance: bool,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self::with_data_dir(data_dir)
    }
}

impl Config {
    /// Build a configuration rooted at `data_dir`, other fields defaulted
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            podcasts_dir: data_dir.join(PODCASTS_DIRNAME),
            database: data_dir.join(DATABASE_FILENAME),
            data_dir,
            listened_threshold: DEFAULT_LISTENED_THRESHOLD,
            max_retries: DEFAULT_MAX_RETRIES,
            sample_interval_secs: 1,
            speed: 1.0,
            volume: 1.0,
            auto_advance: true,
            user_agent: format!("upodcatcher/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Default location of the configuration file
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILENAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load the configuration from `path`
    ///
    /// A missing file yields the defaults; a present but malformed file is an
    /// error. Fields absent from the file keep their default values, except
    /// `podcasts_dir` and `database`, which follow a configured `data_dir`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::JsonParseFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(config.sanitized())
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            create_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Create the data and podcasts directories if needed
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        create_dir(&self.data_dir)?;
        create_dir(&self.podcasts_dir)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs.max(1))
    }

    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.podcasts_dir == defaults.podcasts_dir {
            self.podcasts_dir = self.data_dir.join(PODCASTS_DIRNAME);
        }
        if self.database == defaults.database {
            self.database = self.data_dir.join(DATABASE_FILENAME);
        }
        if !(self.listened_threshold > 0.0 && self.listened_threshold <= 1.0) {
            self.listened_threshold = DEFAULT_LISTENED_THRESHOLD;
        }
        self.speed = self.speed.clamp(MIN_SPEED, MAX_SPEED);
        self.volume = self.volume.clamp(0.0, 1.0);
        self
    }
}

fn default_data_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}

fn create_dir(path: &Path) -> Result<(), ConfigError> {
    std::fs::create_dir_all(path).map_err(|e| ConfigError::CreateDirectoryFailed {
        path: path.to_path_buf(),
        source: e,
    })
}
