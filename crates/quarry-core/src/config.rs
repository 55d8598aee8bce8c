//! Project-level configuration.
//!
//! Read from `<worktree>/.quarry/config.json`. Every field is optional;
//! anything missing takes its default.

use crate::error::Error;
use crate::paths::IgnoreSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const CONFIG_DIR: &str = ".quarry";
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuarryConfig {
    /// Extra directory names to skip, on top of the built-in set.
    pub ignore: Vec<String>,
    pub max_depth: usize,
    pub watcher: WatcherConfig,
    pub relevance: RelevanceConfig,
    pub cache: CacheConfig,
}

impl Default for QuarryConfig {
    fn default() -> Self {
        Self {
            ignore: Vec::new(),
            max_depth: 10,
            watcher: WatcherConfig::default(),
            relevance: RelevanceConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub poll_interval_ms: u64,
    pub debounce_ms: u64,
}

/// Shortest poll or debounce period; a zero period never fires.
const MIN_PERIOD_MS: u64 = 1;

impl WatcherConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_PERIOD_MS))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.max(MIN_PERIOD_MS))
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            debounce_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelevanceConfig {
    pub chars_per_token: usize,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self { chars_per_token: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum characters of raw config content kept per file.
    pub config_content_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            config_content_limit: 1000,
        }
    }
}

impl QuarryConfig {
    pub fn path_for(worktree: &Path) -> PathBuf {
        worktree.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Parses the config file, failing if it exists but is malformed.
    pub fn from_file(path: &Path) -> Result<Option<Self>, Error> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io(path, e)),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| Error::Config {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Loads the worktree's config, falling back to defaults on any problem.
    pub fn load(worktree: &Path) -> Self {
        let path = Self::path_for(worktree);
        match Self::from_file(&path) {
            Ok(Some(config)) => {
                debug!("Loaded config from {}", path.display());
                config
            }
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn ignore_set(&self) -> IgnoreSet {
        IgnoreSet::with_extra(self.ignore.iter().cloned())
    }
}
