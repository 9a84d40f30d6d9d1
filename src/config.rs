use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::MaybeCache;
use crate::resolve::ShutoffKey;

// =============================================================================
// Cache defaults
// =============================================================================

/// Default number of (product, channel) shutoff answers kept in memory
pub const DEFAULT_SHUTOFF_CACHE_SIZE: usize = 100;

/// Default lifetime of a cached shutoff answer (1 minute)
pub const DEFAULT_SHUTOFF_CACHE_TTL_SECS: u64 = 60;

const APP_DIR: &str = "update-resolver";

/// Service configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfig {
    pub cache: CacheConfig,
    /// Hosts patch URLs may point at
    pub whitelisted_domains: Vec<String>,
    /// URL prefixes that receive `force=1` for forced requests
    pub special_force_hosts: Vec<String>,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            whitelisted_domains: Vec::new(),
            special_force_hosts: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

/// Cache-related configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    pub shutoffs: CacheSlotConfig,
    /// Clone cached values on every read and write
    pub make_copies: bool,
}

/// Individual cache configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheSlotConfig {
    pub enabled: bool,
    pub max_size: usize,
    pub ttl_seconds: u64,
}

impl Default for CacheSlotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size: DEFAULT_SHUTOFF_CACHE_SIZE,
            ttl_seconds: DEFAULT_SHUTOFF_CACHE_TTL_SECS,
        }
    }
}

impl ServiceConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Build the shutoff cache described by `cache.shutoffs`
    pub fn shutoff_cache(&self) -> MaybeCache<ShutoffKey, bool> {
        let slot = &self.cache.shutoffs;
        if !slot.enabled {
            return MaybeCache::disabled();
        }
        MaybeCache::new(
            "updates_disabled",
            slot.max_size,
            Duration::from_secs(slot.ttl_seconds),
        )
        .with_copies(self.cache.make_copies)
    }
}

/// Returns the path to the data directory for update-resolver.
/// Uses $XDG_DATA_HOME/update-resolver if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/update-resolver,
/// or ./update-resolver if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("update-resolver.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use std::sync::Arc;

    #[test]
    fn service_config_from_partial_object_uses_defaults_for_missing_fields() {
        let result = serde_json::from_value::<ServiceConfig>(json!({
            "whitelistedDomains": ["download.example.com"]
        }))
        .unwrap();

        assert_eq!(result.whitelisted_domains, ["download.example.com"]);
        assert_eq!(result.cache, CacheConfig::default());
        assert_eq!(result.log_level, "info");
    }

    #[test]
    fn service_config_from_full_object_parses_all_fields() {
        let result = serde_json::from_value::<ServiceConfig>(json!({
            "cache": {
                "shutoffs": { "enabled": false, "maxSize": 10, "ttlSeconds": 5 },
                "makeCopies": true
            },
            "whitelistedDomains": ["a.example.com", "b.example.com"],
            "specialForceHosts": ["https://a.example.com"],
            "logLevel": "debug"
        }))
        .unwrap();

        assert_eq!(
            result,
            ServiceConfig {
                cache: CacheConfig {
                    shutoffs: CacheSlotConfig {
                        enabled: false,
                        max_size: 10,
                        ttl_seconds: 5,
                    },
                    make_copies: true,
                },
                whitelisted_domains: vec!["a.example.com".to_string(), "b.example.com".to_string()],
                special_force_hosts: vec!["https://a.example.com".to_string()],
                log_level: "debug".to_string(),
            }
        );
    }

    #[test]
    fn load_reads_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"logLevel": "warn"}}"#).unwrap();

        let config = ServiceConfig::load(file.path()).unwrap();

        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn load_fails_on_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(ServiceConfig::load(file.path()).is_err());
    }

    #[test]
    fn shutoff_cache_follows_enabled_flag() {
        let enabled = ServiceConfig::default().shutoff_cache();
        let disabled = ServiceConfig {
            cache: CacheConfig {
                shutoffs: CacheSlotConfig {
                    enabled: false,
                    ..Default::default()
                },
                make_copies: false,
            },
            ..Default::default()
        }
        .shutoff_cache();

        enabled.put(("P".to_string(), "release".to_string()), Arc::new(true));
        assert!(enabled.is_enabled());
        assert_eq!(
            enabled.get(&("P".to_string(), "release".to_string())).as_deref(),
            Some(&true)
        );
        assert!(!disabled.is_enabled());
    }

    #[test]
    fn data_dir_with_env_uses_xdg_data_home_when_set() {
        let path = data_dir_with_env(
            Some("/tmp/test-data".to_string()),
            Some(PathBuf::from("/home/user")),
        );

        assert_eq!(path, PathBuf::from("/tmp/test-data/update-resolver"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_home_local_share() {
        let path = data_dir_with_env(None, Some(PathBuf::from("/home/user")));

        assert_eq!(path, PathBuf::from("/home/user/.local/share/update-resolver"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_current_dir_when_no_dirs_available() {
        let path = data_dir_with_env(None, None);
        assert_eq!(path, PathBuf::from("./update-resolver"));
    }
}
