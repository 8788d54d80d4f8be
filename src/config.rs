//! Configuration Module
//!
//! Handles loading cache sizing, TTL and warming settings from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::MAX_TTL;
use crate::error::{CacheError, Result};

/// Size and TTL policy for one named cache role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleConfig {
    /// Maximum number of entries the role can hold
    pub max_size: usize,
    /// Default TTL in seconds
    pub default_ttl: u64,
}

impl RoleConfig {
    pub const fn new(max_size: usize, default_ttl: u64) -> Self {
        Self {
            max_size,
            default_ttl,
        }
    }

    /// Default TTL as a Duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    fn validate(&self, role: &str) -> Result<()> {
        if self.max_size == 0 {
            return Err(CacheError::InvalidConfig(format!(
                "{} cache max_size must be positive",
                role
            )));
        }
        if self.default_ttl == 0 {
            return Err(CacheError::InvalidConfig(format!(
                "{} cache default_ttl must be positive",
                role
            )));
        }
        if self.default_ttl > MAX_TTL.as_secs() {
            return Err(CacheError::InvalidConfig(format!(
                "{} cache default_ttl must not exceed {} seconds",
                role,
                MAX_TTL.as_secs()
            )));
        }
        Ok(())
    }
}

/// Cache layer configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Raw dataset cache
    pub data: RoleConfig,
    /// Per-request query result cache
    pub query: RoleConfig,
    /// Expensive grouped computation cache
    pub aggregation: RoleConfig,
    /// Whether startup and scheduled warming run at all
    pub enable_warming: bool,
    /// Interval in seconds between scheduled warming cycles
    pub warming_interval: u64,
    /// Interval in seconds between expiry sweeps
    pub cleanup_interval: u64,
    /// Deployment environment name (`production`, `development`, `testing`)
    pub environment: String,
    /// Backing JSON dataset
    pub data_file_path: PathBuf,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DATA_CACHE_SIZE` / `DATA_CACHE_TTL` (default: 10 / 3600)
    /// - `QUERY_CACHE_SIZE` / `QUERY_CACHE_TTL` (default: 500 / 1800)
    /// - `AGGREGATION_CACHE_SIZE` / `AGGREGATION_CACHE_TTL` (default: 200 / 3600)
    /// - `ENABLE_CACHE_WARMING` (default: true)
    /// - `CACHE_WARMING_INTERVAL` (default: 21600)
    /// - `CACHE_CLEANUP_INTERVAL` (default: 60)
    /// - `ENVIRONMENT` (default: development)
    /// - `DATA_FILE_PATH` (default: data/str_dummy_data_with_booking_date.json)
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data: RoleConfig::new(
                env_or("DATA_CACHE_SIZE", defaults.data.max_size),
                env_or("DATA_CACHE_TTL", defaults.data.default_ttl),
            ),
            query: RoleConfig::new(
                env_or("QUERY_CACHE_SIZE", defaults.query.max_size),
                env_or("QUERY_CACHE_TTL", defaults.query.default_ttl),
            ),
            aggregation: RoleConfig::new(
                env_or("AGGREGATION_CACHE_SIZE", defaults.aggregation.max_size),
                env_or("AGGREGATION_CACHE_TTL", defaults.aggregation.default_ttl),
            ),
            enable_warming: env::var("ENABLE_CACHE_WARMING")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.enable_warming),
            warming_interval: env_or("CACHE_WARMING_INTERVAL", defaults.warming_interval),
            cleanup_interval: env_or("CACHE_CLEANUP_INTERVAL", defaults.cleanup_interval),
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            data_file_path: env::var("DATA_FILE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_file_path),
        }
    }

    /// Larger, longer-lived roles for production deployments.
    pub fn production() -> Self {
        Self {
            data: RoleConfig::new(20, 7200),
            query: RoleConfig::new(1000, 3600),
            aggregation: RoleConfig::new(500, 7200),
            environment: "production".to_string(),
            ..Self::default()
        }
    }

    /// Smaller, shorter-lived roles for local development.
    pub fn development() -> Self {
        Self {
            data: RoleConfig::new(5, 1800),
            query: RoleConfig::new(100, 900),
            aggregation: RoleConfig::new(50, 1800),
            ..Self::default()
        }
    }

    /// Rejects zero sizes, zero or oversized TTLs and zero intervals.
    pub fn validate(&self) -> Result<()> {
        self.data.validate("data")?;
        self.query.validate("query")?;
        self.aggregation.validate("aggregation")?;
        if self.warming_interval == 0 {
            return Err(CacheError::InvalidConfig(
                "warming_interval must be positive".to_string(),
            ));
        }
        if self.cleanup_interval == 0 {
            return Err(CacheError::InvalidConfig(
                "cleanup_interval must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            data: RoleConfig::new(10, 3600),
            query: RoleConfig::new(500, 1800),
            aggregation: RoleConfig::new(200, 3600),
            enable_warming: true,
            warming_interval: 6 * 3600,
            cleanup_interval: 60,
            environment: "development".to_string(),
            data_file_path: PathBuf::from("data/str_dummy_data_with_booking_date.json"),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
