//! Configuration Module
//!
//! Cache tuning (`CacheConfig`) and process settings (`Config`) loaded from
//! environment variables.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bytes per megabyte used when converting `max_cache_size`.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Default number of related studies warmed per lookup.
pub const DEFAULT_PREFETCH_LIMIT: usize = 5;

// == Cache Config ==
/// Tuning for one `ImagingCacheService` instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// Size budget in megabytes
    pub max_cache_size: f64,
    /// Maximum entry age in minutes
    pub max_study_age: u64,
    /// Whether related studies are warmed after a lookup
    pub prefetch_enabled: bool,
    /// Maximum related studies warmed per lookup
    pub prefetch_limit: usize,
    /// Counts payloads at their compressed size
    pub compression_enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cache_size: 500.0,
            max_study_age: 60,
            prefetch_enabled: true,
            prefetch_limit: DEFAULT_PREFETCH_LIMIT,
            compression_enabled: true,
        }
    }
}

impl CacheConfig {
    /// Builds a config from a partial one, filling gaps with defaults.
    pub fn from_partial(partial: PartialCacheConfig) -> Self {
        Self::default().merged(partial)
    }

    /// Returns a copy of `self` with every field set in `partial` overridden.
    pub fn merged(&self, partial: PartialCacheConfig) -> Self {
        Self {
            max_cache_size: partial.max_cache_size.unwrap_or(self.max_cache_size),
            max_study_age: partial.max_study_age.unwrap_or(self.max_study_age),
            prefetch_enabled: partial.prefetch_enabled.unwrap_or(self.prefetch_enabled),
            prefetch_limit: partial.prefetch_limit.unwrap_or(self.prefetch_limit),
            compression_enabled: partial
                .compression_enabled
                .unwrap_or(self.compression_enabled),
        }
    }

    /// Size budget in bytes. Zero, negative or NaN budgets collapse to 0.
    pub fn max_cache_bytes(&self) -> u64 {
        let bytes = self.max_cache_size * BYTES_PER_MB;
        if bytes.is_finite() && bytes > 0.0 {
            bytes as u64
        } else {
            0
        }
    }

    /// Entry time-to-live.
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_study_age.saturating_mul(60))
    }
}

// == Partial Cache Config ==
/// Caller-supplied overrides; unset fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialCacheConfig {
    pub max_cache_size: Option<f64>,
    pub max_study_age: Option<u64>,
    pub prefetch_enabled: Option<bool>,
    pub prefetch_limit: Option<usize>,
    pub compression_enabled: Option<bool>,
}

impl PartialCacheConfig {
    /// Reads overrides from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_CACHE_SIZE_MB`
    /// - `MAX_STUDY_AGE_MINUTES`
    /// - `PREFETCH_ENABLED`
    /// - `PREFETCH_LIMIT`
    /// - `COMPRESSION_ENABLED`
    pub fn from_env() -> Self {
        Self {
            max_cache_size: env_parse("MAX_CACHE_SIZE_MB"),
            max_study_age: env_parse("MAX_STUDY_AGE_MINUTES"),
            prefetch_enabled: env_parse("PREFETCH_ENABLED"),
            prefetch_limit: env_parse("PREFETCH_LIMIT"),
            compression_enabled: env_parse("COMPRESSION_ENABLED"),
        }
    }
}

impl From<CacheConfig> for PartialCacheConfig {
    fn from(config: CacheConfig) -> Self {
        Self {
            max_cache_size: Some(config.max_cache_size),
            max_study_age: Some(config.max_study_age),
            prefetch_enabled: Some(config.prefetch_enabled),
            prefetch_limit: Some(config.prefetch_limit),
            compression_enabled: Some(config.compression_enabled),
        }
    }
}

// == Process Config ==
/// Process configuration for the gateway binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Background TTL sweep interval in seconds
    pub cleanup_interval: u64,
    /// Base URL of the remote imaging API
    pub api_base_url: String,
    /// Bearer token presented to the remote imaging API
    pub api_token: String,
    /// Per-request transport timeout in seconds
    pub api_timeout: u64,
    /// Cache tuning
    pub cache: CacheConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - TTL sweep frequency in seconds (default: 60)
    /// - `IMAGING_API_BASE_URL` - upstream base URL (default: http://localhost:8080)
    /// - `IMAGING_API_TOKEN` - bearer token (default: empty)
    /// - `IMAGING_API_TIMEOUT_SECS` - transport timeout (default: 30)
    /// - plus the cache variables read by [`PartialCacheConfig::from_env`]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_parse("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: env_parse("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            api_base_url: env::var("IMAGING_API_BASE_URL").unwrap_or(defaults.api_base_url),
            api_token: env::var("IMAGING_API_TOKEN").unwrap_or(defaults.api_token),
            api_timeout: env_parse("IMAGING_API_TIMEOUT_SECS").unwrap_or(defaults.api_timeout),
            cache: CacheConfig::from_partial(PartialCacheConfig::from_env()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cleanup_interval: 60,
            api_base_url: "http://localhost:8080".to_string(),
            api_token: String::new(),
            api_timeout: 30,
            cache: CacheConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
