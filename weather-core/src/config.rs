use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{provider::ProviderId, resolver::ResolverKind};

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const BIND_ENV_VAR: &str = "CITY_WEATHER_BIND";

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: DEFAULT_BIND.to_string() }
    }
}

/// Where upstream services live and how long a single call may take.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub openweather_base_url: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            openweather_base_url: DEFAULT_OPENWEATHER_BASE_URL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional resolver strategy, "assisted" or "passthrough".
    pub default_resolver: Option<String>,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    pub log_level: Option<String>,
}

impl Config {
    /// Resolver strategy to use.
    ///
    /// Without an explicit choice, the assisted resolver is picked whenever an
    /// OpenAI key is available.
    pub fn default_resolver_kind(&self) -> Result<ResolverKind> {
        match self.default_resolver.as_deref() {
            Some(s) => ResolverKind::try_from(s),
            None if self.is_provider_configured(ProviderId::OpenAi) => Ok(ResolverKind::Assisted),
            None => Ok(ResolverKind::PassThrough),
        }
    }

    pub fn set_default_resolver(&mut self, kind: ResolverKind) {
        self.default_resolver = Some(kind.as_str().to_string());
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// Load config from the platform config directory, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Load config from `path`, or return an empty default if it doesn't exist yet.
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
        let dirs = ProjectDirs::from("dev", "city-weather", "city-weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Override file values with `OWM_API_KEY`, `OPENAI_API_KEY` and `CITY_WEATHER_BIND`.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for id in ProviderId::all() {
            if let Some(key) = lookup(id.env_var()).filter(|k| !k.trim().is_empty()) {
                self.upsert_provider_api_key(*id, key.trim().to_string());
            }
        }

        if let Some(bind) = lookup(BIND_ENV_VAR).filter(|b| !b.trim().is_empty()) {
            self.server.bind = bind.trim().to_string();
        }
    }

    /// Set or replace a provider API key.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolver_defaults_to_passthrough_without_openai_key() {
        let cfg = Config::default();
        assert_eq!(cfg.default_resolver_kind().unwrap(), ResolverKind::PassThrough);
    }

    #[test]
    fn resolver_defaults_to_assisted_with_openai_key() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenAi, "sk-test".into());
        assert_eq!(cfg.default_resolver_kind().unwrap(), ResolverKind::Assisted);
    }

    #[test]
    fn explicit_resolver_overrides_default() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenAi, "sk-test".into());
        cfg.set_default_resolver(ResolverKind::PassThrough);
        assert_eq!(cfg.default_resolver_kind().unwrap(), ResolverKind::PassThrough);
    }

    #[test]
    fn unknown_resolver_is_an_error() {
        let cfg = Config { default_resolver: Some("magic".into()), ..Config::default() };
        let err = cfg.default_resolver_kind().unwrap_err();
        assert!(err.to_string().contains("Unknown resolver"));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "FROM_FILE".into());

        cfg.apply_env_with(|key| match key {
            "OWM_API_KEY" => Some("FROM_ENV".to_string()),
            "CITY_WEATHER_BIND" => Some("0.0.0.0:8080".to_string()),
            "OPENAI_API_KEY" => Some("   ".to_string()),
            _ => None,
        });

        assert_eq!(cfg.provider_api_key(ProviderId::OpenWeather), Some("FROM_ENV"));
        assert!(!cfg.is_provider_configured(ProviderId::OpenAi));
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();

        assert!(cfg.providers.is_empty());
        assert_eq!(cfg.server.bind, DEFAULT_BIND);
        assert_eq!(cfg.upstream.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(cfg.log_level(), "info");
    }

    #[test]
    fn save_then_load_keeps_keys_and_upstream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OWM".into());
        cfg.upstream.openai_model = "gpt-4o-mini".into();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.provider_api_key(ProviderId::OpenWeather), Some("OWM"));
        assert_eq!(loaded.upstream.openai_model, "gpt-4o-mini");
    }

    #[test]
    fn partial_upstream_table_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [upstream]
            timeout_secs = 3
            "#,
        )
        .unwrap();

        assert_eq!(cfg.upstream.timeout(), Duration::from_secs(3));
        assert_eq!(cfg.upstream.openweather_base_url, DEFAULT_OPENWEATHER_BASE_URL);
        assert_eq!(cfg.upstream.openai_model, DEFAULT_OPENAI_MODEL);
    }
}
