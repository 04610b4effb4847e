//! Loader configuration.
//!
//! Every field has a default, so an empty YAML document is a valid config:
//!
//! ```yaml
//! coordination_thread_name: omni-loader-main
//! disk_cache_pool:
//!   name: disk-cache
//!   max_in_flight: 1
//! source_pool:
//!   name: source
//!   max_in_flight: 8
//! ```

use std::num::NonZeroUsize;

use serde::Deserialize;

use crate::error::{LoaderError, Result};

const DEFAULT_COORDINATION_THREAD_NAME: &str = "omni-loader-main";
const DEFAULT_DISK_CACHE_POOL_NAME: &str = "disk-cache";
const DEFAULT_SOURCE_POOL_NAME: &str = "source";
const FALLBACK_SOURCE_PARALLELISM: usize = 4;

/// Sizing for one worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Pool name, used in logs.
    pub name: String,
    /// Maximum number of work units running at once.
    pub max_in_flight: usize,
}

impl PoolConfig {
    /// Create a pool config.
    pub fn new(name: impl Into<String>, max_in_flight: usize) -> Self {
        Self {
            name: name.into(),
            max_in_flight,
        }
    }

    fn normalized(mut self, fallback_name: &str) -> Self {
        self.max_in_flight = self.max_in_flight.max(1);
        let trimmed = self.name.trim();
        self.name = if trimmed.is_empty() {
            fallback_name.to_string()
        } else {
            trimmed.to_string()
        };
        self
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_POOL_NAME, default_source_parallelism())
    }
}

/// Config for the coordination thread and both worker pools.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Name of the OS thread that delivers outcomes to callbacks.
    pub coordination_thread_name: String,
    /// Primary pool; every job starts here.
    pub disk_cache_pool: PoolConfig,
    /// Fallback pool used when a work unit reschedules itself.
    pub source_pool: PoolConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            coordination_thread_name: DEFAULT_COORDINATION_THREAD_NAME.to_string(),
            disk_cache_pool: PoolConfig::new(DEFAULT_DISK_CACHE_POOL_NAME, 1),
            source_pool: PoolConfig::new(DEFAULT_SOURCE_POOL_NAME, default_source_parallelism()),
        }
    }
}

impl LoaderConfig {
    /// Parse a YAML document and normalise it.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_yaml::from_str(raw).map_err(|error| LoaderError::InvalidConfig(error.to_string()))?;
        Ok(config.normalized())
    }

    /// Clamp pool sizes to at least one and fill in blank names.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let trimmed = self.coordination_thread_name.trim();
        self.coordination_thread_name = if trimmed.is_empty() {
            DEFAULT_COORDINATION_THREAD_NAME.to_string()
        } else {
            trimmed.to_string()
        };
        self.disk_cache_pool = self.disk_cache_pool.normalized(DEFAULT_DISK_CACHE_POOL_NAME);
        self.source_pool = self.source_pool.normalized(DEFAULT_SOURCE_POOL_NAME);
        self
    }
}

fn default_source_parallelism() -> usize {
    std::thread::available_parallelism().map_or(FALLBACK_SOURCE_PARALLELISM, NonZeroUsize::get)
}
