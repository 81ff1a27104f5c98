//! Configuration types, loaded from the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::store::DEFAULT_STORAGE_KEY;

/// Reframing service settings.
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Base URL of the reframing service, without a trailing slash.
    pub base_url: String,
    /// Upper bound on any single request.
    pub timeout: Duration,
    /// When false the helper is never offered.
    pub enabled: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout: Duration::from_secs(10),
            enabled: true,
        }
    }
}

impl AiConfig {
    /// Load from environment variables, using defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = std::env::var("SOFT_STARTUP_API_URL")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.base_url);

        let timeout = parse_env("SOFT_STARTUP_AI_TIMEOUT_SECS")
            .filter(|secs: &u64| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        let enabled = parse_env("SOFT_STARTUP_AI_ENABLED").unwrap_or(defaults.enabled);

        Self {
            base_url,
            timeout,
            enabled,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the session file.
    pub data_dir: PathBuf,
    /// Namespaced key the session collection is stored under.
    pub storage_key: String,
    pub ai: AiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            ai: AiConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("SOFT_STARTUP_DATA_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let storage_key = std::env::var("SOFT_STARTUP_STORAGE_KEY")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());

        Self {
            data_dir,
            storage_key,
            ai: AiConfig::from_env(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".soft-startup")
}

fn parse_var<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Ok(raw) = std::env::var(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{raw:?}: {e}"),
        })
}

/// Parse an optional variable, warning and ignoring it when malformed.
fn parse_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    parse_var(key).unwrap_or_else(|e| {
        tracing::warn!("{e}, using default");
        None
    })
}
