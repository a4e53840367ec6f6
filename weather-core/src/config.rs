use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{error::ConfigError, provider::ProviderId};

pub const STATIC_DIR_ENV: &str = "WEATHER_STATIC_DIR";
pub const PORT_ENV: &str = "WEATHER_PORT";
pub const UPSTREAM_TIMEOUT_ENV: &str = "WEATHER_UPSTREAM_TIMEOUT_SECS";

/// Configuration for a single provider (API key, optional endpoint override).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,

    /// Endpoint root, e.g. "https://api.weatherapi.com/v1". Defaults to the public API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Listener and asset settings for the HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Prebuilt frontend bundle. When unset, only the relay routes are served.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,

    pub upstream_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            static_dir: None,
            upstream_timeout_secs: 10,
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Example TOML:
    /// [providers.weatherapi]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Validated, immutable view of one provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub api_key: String,
    pub base_url: String,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Everything the relays need, checked once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    pub weatherapi: ProviderSettings,
    pub openweather: ProviderSettings,
    pub upstream_timeout: Duration,
}

impl RelaySettings {
    pub fn provider(&self, id: ProviderId) -> &ProviderSettings {
        match id {
            ProviderId::WeatherApi => &self.weatherapi,
            ProviderId::OpenWeather => &self.openweather,
        }
    }
}

impl Config {
    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Load config from an explicit path; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-relay", "weather-server")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set or replace a provider API key, keeping any endpoint override.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        match self.providers.get_mut(provider_id.as_str()) {
            Some(cfg) => cfg.api_key = api_key,
            None => {
                self.providers
                    .insert(provider_id.as_str().to_string(), ProviderConfig { api_key, base_url: None });
            }
        }
    }

    /// Returns the API key for a provider, if present and non-empty.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id)
            .map(|cfg| cfg.api_key.as_str())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Overlay values from `lookup`. Empty values count as unset.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        for id in ProviderId::all() {
            if let Some(key) = get(id.env_var()) {
                self.upsert_provider_api_key(*id, key);
            }
        }

        if let Some(dir) = get(STATIC_DIR_ENV) {
            self.server.static_dir = Some(PathBuf::from(dir));
        }

        if let Some(port) = get(PORT_ENV) {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: PORT_ENV,
                value: port.clone(),
            })?;
        }

        if let Some(secs) = get(UPSTREAM_TIMEOUT_ENV) {
            self.server.upstream_timeout_secs =
                secs.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    name: UPSTREAM_TIMEOUT_ENV,
                    value: secs.clone(),
                })?;
        }

        Ok(())
    }

    /// Validate and freeze the relay configuration. Fails if either key is missing.
    pub fn relay_settings(&self) -> Result<RelaySettings, ConfigError> {
        if self.server.upstream_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(RelaySettings {
            weatherapi: self.provider_settings(ProviderId::WeatherApi)?,
            openweather: self.provider_settings(ProviderId::OpenWeather)?,
            upstream_timeout: Duration::from_secs(self.server.upstream_timeout_secs),
        })
    }

    fn provider_settings(&self, id: ProviderId) -> Result<ProviderSettings, ConfigError> {
        let api_key = self.provider_api_key(id).ok_or(ConfigError::MissingApiKey {
            provider: id,
            env_var: id.env_var(),
        })?;

        let base_url = self
            .provider_config(id)
            .and_then(|cfg| cfg.base_url.clone())
            .unwrap_or_else(|| id.default_base_url().to_string());

        Ok(ProviderSettings { api_key: api_key.to_string(), base_url })
    }
}
