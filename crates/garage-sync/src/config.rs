//! # Configuration
//!
//! Where the remote store lives, where the cache file goes, and which
//! country code bare mobile numbers get.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     GARAGE_REMOTE_URL=https://project.supabase.co                      │
//! │     GARAGE_REMOTE_API_KEY=...                                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/garage-desk/garage.toml (Linux)                          │
//! │     ~/Library/Application Support/com.garagedesk.garage-desk/...       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     no remote, cache in the platform data dir, country code 91         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [remote]
//! url = "https://project.supabase.co"
//! api_key = "public-anon-key"
//! timeout_secs = 15
//!
//! [cache]
//! path = "/var/lib/garage-desk/cache.db"
//!
//! [outreach]
//! default_country_code = "91"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{SyncError, SyncResult};

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "garage.toml";

/// Cache file used when no platform data directory is available.
const FALLBACK_CACHE_PATH: &str = "./garage-cache.db";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "garagedesk", "garage-desk")
}

// =============================================================================
// Sections
// =============================================================================

/// Remote table store (PostgREST).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Project base URL, without `/rest/v1`.
    #[serde(default)]
    pub url: Option<String>,

    /// Sent as both `apikey` and bearer token.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for RemoteSettings {
    fn default() -> Self {
        RemoteSettings {
            url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// SQLite cache file. Defaults to `cache.db` in the platform data dir.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachSettings {
    /// Prefixed to exactly-10-digit mobile numbers in WhatsApp links.
    #[serde(default = "default_country_code")]
    pub default_country_code: String,
}

fn default_country_code() -> String {
    garage_core::DEFAULT_COUNTRY_CODE.to_string()
}

impl Default for OutreachSettings {
    fn default() -> Self {
        OutreachSettings {
            default_country_code: default_country_code(),
        }
    }
}

// =============================================================================
// GarageConfig
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GarageConfig {
    #[serde(default)]
    pub remote: RemoteSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub outreach: OutreachSettings,
}

impl GarageConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`garage.toml`)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Writes the configuration as pretty TOML, creating parent dirs.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Config saved");
        Ok(())
    }

    /// Validates the configuration.
    ///
    /// ## Rules
    /// - Remote URL, when set, parses and uses http or https
    /// - Timeout is positive
    /// - Country code is 1 to 4 digits
    pub fn validate(&self) -> SyncResult<()> {
        if let Some(raw) = self.remote_url() {
            let url = Url::parse(raw)?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(SyncError::InvalidUrl(format!(
                    "Remote URL must start with http:// or https://, got: {}",
                    raw
                )));
            }
        }

        if self.remote.timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        let code = &self.outreach.default_country_code;
        if code.is_empty() || code.len() > 4 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(SyncError::InvalidConfig(format!(
                "default_country_code must be 1 to 4 digits, got: {:?}",
                code
            )));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `GARAGE_*` overrides from `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("GARAGE_REMOTE_URL") {
            debug!(url = %url, "Overriding remote URL from environment");
            self.remote.url = Some(url);
        }

        if let Some(key) = lookup("GARAGE_REMOTE_API_KEY") {
            self.remote.api_key = Some(key);
        }

        if let Some(timeout) = lookup("GARAGE_REMOTE_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.remote.timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring non-numeric GARAGE_REMOTE_TIMEOUT_SECS"),
            }
        }

        if let Some(path) = lookup("GARAGE_CACHE_PATH") {
            debug!(path = %path, "Overriding cache path from environment");
            self.cache.path = Some(PathBuf::from(path));
        }

        if let Some(code) = lookup("GARAGE_COUNTRY_CODE") {
            self.outreach.default_country_code = code.trim_start_matches('+').to_string();
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// The configured remote URL, if any.
    pub fn remote_url(&self) -> Option<&str> {
        self.remote
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn api_key(&self) -> &str {
        self.remote.api_key.as_deref().unwrap_or_default()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.remote.timeout_secs)
    }

    /// The cache file path: configured, platform data dir, or `./garage-cache.db`.
    pub fn cache_path(&self) -> PathBuf {
        self.cache
            .path
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().join("cache.db")))
            .unwrap_or_else(|| PathBuf::from(FALLBACK_CACHE_PATH))
    }

    pub fn country_code(&self) -> &str {
        &self.outreach.default_country_code
    }
}
