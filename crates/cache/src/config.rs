//! Cache configuration management with precedence and validation
use crate::errors::{CacheError, Result};
use crate::validation::MAX_TTL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Entry ceiling applied when paranoia mode is on
pub const PARANOIA_MAX_ENTRIES: usize = 10_000;
/// Memory ceiling (MB) applied when paranoia mode is on
pub const PARANOIA_MAX_MEMORY_MB: u64 = 10;

/// Write-ahead log settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalConfig {
    /// Path of the append-only log file
    pub path: PathBuf,
    /// Call `sync_data` after every append instead of only flushing
    pub sync_on_append: bool,
    /// Rebuild the in-memory state from the log when the cache is built
    pub replay_on_open: bool,
}

impl WalConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sync_on_append: false,
            replay_on_open: true,
        }
    }
}

/// Base configuration for the sharded cache
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Number of independently locked shards
    pub shard_count: usize,
    /// Maximum number of live entries across all shards
    pub max_entries: usize,
    /// Maximum estimated memory footprint in megabytes
    pub max_memory_mb: u64,
    /// TTL applied when a caller does not provide one
    pub default_ttl: Duration,
    /// Interval of the background expiry sweep; zero disables it
    pub cleanup_interval: Duration,
    /// Clamp both ceilings to small fixed values
    pub paranoia_mode: bool,
    /// Name of the eviction policy
    pub eviction_policy: String,
    /// Durable write-ahead log, disabled when `None`
    pub wal: Option<WalConfig>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            shard_count: 16,
            max_entries: 100_000,
            max_memory_mb: 256,
            default_ttl: Duration::from_secs(3600),
            cleanup_interval: Duration::from_secs(60),
            paranoia_mode: false,
            eviction_policy: "lru".to_string(),
            wal: None,
        }
    }
}

/// Ceilings actually enforced after paranoia clamping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EffectiveLimits {
    pub max_entries: usize,
    pub max_memory_bytes: u64,
}

impl CacheConfig {
    /// Check that the configuration can build a working cache
    pub fn validate(&self) -> Result<()> {
        if self.shard_count == 0 {
            return Err(CacheError::configuration("shard_count must be at least 1"));
        }
        if self.max_entries == 0 {
            return Err(CacheError::configuration("max_entries must be at least 1"));
        }
        if self.max_memory_mb == 0 {
            return Err(CacheError::configuration("max_memory_mb must be at least 1"));
        }
        if self.default_ttl > MAX_TTL {
            return Err(CacheError::configuration(format!(
                "default_ttl of {}s exceeds maximum of {}s",
                self.default_ttl.as_secs(),
                MAX_TTL.as_secs()
            )));
        }
        Ok(())
    }

    /// Ceilings after applying paranoia mode
    pub fn effective_limits(&self) -> EffectiveLimits {
        let (max_entries, max_memory_mb) = if self.paranoia_mode {
            (
                self.max_entries.min(PARANOIA_MAX_ENTRIES),
                self.max_memory_mb.min(PARANOIA_MAX_MEMORY_MB),
            )
        } else {
            (self.max_entries, self.max_memory_mb)
        };

        EffectiveLimits {
            max_entries,
            max_memory_bytes: max_memory_mb.saturating_mul(1024 * 1024),
        }
    }
}

/// Builder for creating cache configurations
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shard_count(mut self, shard_count: usize) -> Self {
        self.config.shard_count = shard_count;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.config.max_entries = max_entries;
        self
    }

    pub fn with_max_memory_mb(mut self, max_memory_mb: u64) -> Self {
        self.config.max_memory_mb = max_memory_mb;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.config.default_ttl = ttl;
        self
    }

    /// Set the background sweep interval (zero disables the sweep)
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.config.cleanup_interval = interval;
        self
    }

    pub fn with_paranoia_mode(mut self, enabled: bool) -> Self {
        self.config.paranoia_mode = enabled;
        self
    }

    pub fn with_eviction_policy(mut self, policy: impl Into<String>) -> Self {
        self.config.eviction_policy = policy.into();
        self
    }

    pub fn with_wal(mut self, wal: WalConfig) -> Self {
        self.config.wal = Some(wal);
        self
    }

    /// Build the configuration
    pub fn build(self) -> CacheConfig {
        self.config
    }
}

/// Source of configuration for debugging and precedence tracking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Default configuration
    Default,
    /// Configuration file
    ConfigFile(PathBuf),
    /// Environment variable
    EnvironmentVariable(String),
}

/// Configuration plus where it last came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: CacheConfig,
    pub source: ConfigSource,
}

/// `cache` section of the JSON config file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileCacheSection {
    shard_count: Option<usize>,
    max_entries: Option<usize>,
    max_memory_mb: Option<u64>,
    default_ttl_secs: Option<u64>,
    cleanup_interval_secs: Option<u64>,
    paranoia_mode: Option<bool>,
    eviction_policy: Option<String>,
    wal_path: Option<PathBuf>,
    wal_sync: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default)]
    cache: FileCacheSection,
}

/// Configuration loader that handles precedence: defaults, file, environment
pub struct CacheConfigLoader;

impl CacheConfigLoader {
    /// Load configuration with full precedence handling.
    ///
    /// `path` overrides the default config file location.
    pub fn load(path: Option<&Path>) -> Result<LoadedConfig> {
        let mut loaded = LoadedConfig {
            config: CacheConfig::default(),
            source: ConfigSource::Default,
        };

        let file_path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_config_path(),
        };

        if let Some(file_path) = file_path {
            if file_path.exists() {
                let section = Self::read_file(&file_path)?;
                Self::apply_file_section(&mut loaded.config, section);
                loaded.source = ConfigSource::ConfigFile(file_path);
            } else if path.is_some() {
                return Err(CacheError::configuration(format!(
                    "config file '{}' does not exist",
                    file_path.display()
                )));
            }
        }

        if Self::apply_env(&mut loaded.config)? {
            loaded.source = ConfigSource::EnvironmentVariable("SHARDCACHE_*".to_string());
        }

        loaded.config.validate()?;
        tracing::debug!(source = ?loaded.source, "Loaded cache configuration");
        Ok(loaded)
    }

    /// `$XDG_CONFIG_HOME/shardcache/config.json`, falling back to the platform config dir
    pub fn default_config_path() -> Option<PathBuf> {
        let config_dir = match std::env::var_os("XDG_CONFIG_HOME") {
            Some(dir) => Some(PathBuf::from(dir)),
            None => dirs::config_dir(),
        };
        config_dir.map(|dir| dir.join("shardcache").join("config.json"))
    }

    fn read_file(path: &Path) -> Result<FileCacheSection> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CacheError::io(path, "read config file", e))?;
        let file: FileConfig =
            serde_json::from_str(&content).map_err(|e| CacheError::Serialization {
                context: format!("config file '{}'", path.display()),
                source: Box::new(e),
            })?;
        Ok(file.cache)
    }

    fn apply_file_section(config: &mut CacheConfig, section: FileCacheSection) {
        if let Some(v) = section.shard_count {
            config.shard_count = v;
        }
        if let Some(v) = section.max_entries {
            config.max_entries = v;
        }
        if let Some(v) = section.max_memory_mb {
            config.max_memory_mb = v;
        }
        if let Some(v) = section.default_ttl_secs {
            config.default_ttl = Duration::from_secs(v);
        }
        if let Some(v) = section.cleanup_interval_secs {
            config.cleanup_interval = Duration::from_secs(v);
        }
        if let Some(v) = section.paranoia_mode {
            config.paranoia_mode = v;
        }
        if let Some(v) = section.eviction_policy {
            config.eviction_policy = v;
        }
        if let Some(path) = section.wal_path {
            let mut wal = WalConfig::new(path);
            wal.sync_on_append = section.wal_sync.unwrap_or(false);
            config.wal = Some(wal);
        }
    }

    /// Apply `SHARDCACHE_*` overrides, returning whether any were present
    fn apply_env(config: &mut CacheConfig) -> Result<bool> {
        let mut has_env_config = false;

        if let Some(v) = env_parse::<usize>("SHARDCACHE_SHARDS")? {
            config.shard_count = v;
            has_env_config = true;
        }
        if let Some(v) = env_parse::<usize>("SHARDCACHE_MAX_ENTRIES")? {
            config.max_entries = v;
            has_env_config = true;
        }
        if let Some(v) = env_parse::<u64>("SHARDCACHE_MAX_MEMORY_MB")? {
            config.max_memory_mb = v;
            has_env_config = true;
        }
        if let Some(v) = env_parse::<u64>("SHARDCACHE_DEFAULT_TTL_SECS")? {
            config.default_ttl = Duration::from_secs(v);
            has_env_config = true;
        }
        if let Some(v) = env_parse::<u64>("SHARDCACHE_CLEANUP_INTERVAL_SECS")? {
            config.cleanup_interval = Duration::from_secs(v);
            has_env_config = true;
        }
        if let Ok(v) = std::env::var("SHARDCACHE_PARANOIA") {
            config.paranoia_mode = parse_flag(&v);
            has_env_config = true;
        }
        if let Some(path) = std::env::var_os("SHARDCACHE_WAL_PATH") {
            let previous = config.wal.take();
            let mut wal = WalConfig::new(path);
            if let Some(previous) = previous {
                wal.sync_on_append = previous.sync_on_append;
                wal.replay_on_open = previous.replay_on_open;
            }
            config.wal = Some(wal);
            has_env_config = true;
        }
        if let Ok(v) = std::env::var("SHARDCACHE_WAL_SYNC") {
            match config.wal.as_mut() {
                Some(wal) => {
                    wal.sync_on_append = parse_flag(&v);
                    has_env_config = true;
                }
                None => tracing::debug!(
                    value = %v,
                    "Ignoring SHARDCACHE_WAL_SYNC: no write-ahead log configured"
                ),
            }
        }

        Ok(has_env_config)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| CacheError::configuration(format!("{name}='{raw}' is not a valid number"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const ENV_VARS: &[&str] = &[
        "SHARDCACHE_SHARDS",
        "SHARDCACHE_MAX_ENTRIES",
        "SHARDCACHE_MAX_MEMORY_MB",
        "SHARDCACHE_DEFAULT_TTL_SECS",
        "SHARDCACHE_CLEANUP_INTERVAL_SECS",
        "SHARDCACHE_PARANOIA",
        "SHARDCACHE_WAL_PATH",
        "SHARDCACHE_WAL_SYNC",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_cache_config_builder() {
        let config = CacheConfigBuilder::new()
            .with_shard_count(4)
            .with_max_entries(10)
            .with_paranoia_mode(true)
            .with_wal(WalConfig::new("/tmp/wal.log"))
            .build();

        assert_eq!(config.shard_count, 4);
        assert_eq!(config.max_entries, 10);
        assert!(config.paranoia_mode);
        assert_eq!(config.wal.map(|w| w.path), Some(PathBuf::from("/tmp/wal.log")));
    }

    #[test]
    fn test_paranoia_mode_clamps_limits() {
        let config = CacheConfigBuilder::new()
            .with_max_entries(1_000_000)
            .with_max_memory_mb(4096)
            .with_paranoia_mode(true)
            .build();

        let limits = config.effective_limits();
        assert_eq!(limits.max_entries, PARANOIA_MAX_ENTRIES);
        assert_eq!(limits.max_memory_bytes, 10 * 1024 * 1024);

        // Smaller caller limits survive the clamp
        let config = CacheConfigBuilder::new()
            .with_max_entries(5)
            .with_max_memory_mb(1)
            .with_paranoia_mode(true)
            .build();
        assert_eq!(config.effective_limits().max_entries, 5);
        assert_eq!(config.effective_limits().max_memory_bytes, 1024 * 1024);
    }

    #[test]
    fn test_validate_rejects_zero_shards() {
        let config = CacheConfigBuilder::new().with_shard_count(0).build();
        assert!(matches!(
            config.validate(),
            Err(CacheError::Configuration { .. })
        ));

        let config = CacheConfigBuilder::new()
            .with_default_ttl(MAX_TTL + Duration::from_secs(1))
            .build();
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_config_file_loading() -> Result<()> {
        clear_env();
        let temp_dir = TempDir::new()?;
        let config_file = temp_dir.path().join("config.json");
        std::fs::write(
            &config_file,
            r#"{
                "cache": {
                    "shard_count": 8,
                    "max_entries": 500,
                    "default_ttl_secs": 30,
                    "wal_path": "/tmp/shardcache-test.wal",
                    "wal_sync": true
                }
            }"#,
        )?;

        let loaded = CacheConfigLoader::load(Some(&config_file))?;
        assert_eq!(loaded.source, ConfigSource::ConfigFile(config_file));
        assert_eq!(loaded.config.shard_count, 8);
        assert_eq!(loaded.config.max_entries, 500);
        assert_eq!(loaded.config.default_ttl, Duration::from_secs(30));
        let wal = loaded.config.wal.expect("wal configured");
        assert!(wal.sync_on_append);
        assert!(wal.replay_on_open);
        Ok(())
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() -> Result<()> {
        clear_env();
        let temp_dir = TempDir::new()?;
        let config_file = temp_dir.path().join("config.json");
        std::fs::write(&config_file, r#"{"cache": {"shard_count": 8}}"#)?;

        std::env::set_var("SHARDCACHE_SHARDS", "32");
        std::env::set_var("SHARDCACHE_PARANOIA", "true");
        let loaded = CacheConfigLoader::load(Some(&config_file));
        clear_env();

        let loaded = loaded?;
        assert_eq!(loaded.config.shard_count, 32);
        assert!(loaded.config.paranoia_mode);
        assert!(matches!(
            loaded.source,
            ConfigSource::EnvironmentVariable(_)
        ));
        Ok(())
    }

    #[test]
    #[serial]
    fn test_wal_sync_without_wal_is_ignored() -> Result<()> {
        clear_env();
        let temp_dir = TempDir::new()?;
        let config_file = temp_dir.path().join("config.json");
        std::fs::write(&config_file, r#"{"cache": {"shard_count": 8}}"#)?;

        std::env::set_var("SHARDCACHE_WAL_SYNC", "true");
        let loaded = CacheConfigLoader::load(Some(&config_file));
        clear_env();

        let loaded = loaded?;
        assert!(loaded.config.wal.is_none());
        assert_eq!(loaded.source, ConfigSource::ConfigFile(config_file.clone()));

        // With a WAL from the file, the override applies and is attributed to the environment
        std::fs::write(&config_file, r#"{"cache": {"wal_path": "/tmp/shardcache-sync.wal"}}"#)?;
        std::env::set_var("SHARDCACHE_WAL_SYNC", "1");
        let loaded = CacheConfigLoader::load(Some(&config_file));
        clear_env();

        let loaded = loaded?;
        assert!(loaded.config.wal.is_some_and(|wal| wal.sync_on_append));
        assert!(matches!(loaded.source, ConfigSource::EnvironmentVariable(_)));
        Ok(())
    }

    #[test]
    #[serial]
    fn test_invalid_env_number_is_rejected() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.json");
        std::fs::write(&config_file, "{}").unwrap();

        std::env::set_var("SHARDCACHE_MAX_ENTRIES", "lots");
        let result = CacheConfigLoader::load(Some(&config_file));
        clear_env();

        assert!(matches!(result, Err(CacheError::Configuration { .. })));
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_an_error() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let result = CacheConfigLoader::load(Some(&temp_dir.path().join("absent.json")));
        assert!(matches!(result, Err(CacheError::Configuration { .. })));
    }

    #[test]
    #[serial]
    fn test_unknown_file_field_is_rejected() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.json");
        std::fs::write(&config_file, r#"{"cache": {"shards": 8}}"#).unwrap();

        let result = CacheConfigLoader::load(Some(&config_file));
        assert!(matches!(result, Err(CacheError::Serialization { .. })));
    }
}
