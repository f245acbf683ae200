//! # Configuration
//!
//! Settings are read from the process environment (a `.env` file is loaded
//! first by `main`). Anything unset falls back to [`Config::default`].
//! Tests build configs with [`ConfigBuilder`].

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::shortener::{DEFAULT_CODE_LENGTH, MAX_CODE_LENGTH};

/// Application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Public base address; short URLs are `{base_url}/{code}`
    pub base_url: String,

    /// sqlx connection string
    pub database_url: String,

    /// Length of randomly generated codes
    pub short_code_length: usize,

    /// Cache TTL in seconds
    pub cache_ttl_seconds: u64,

    /// When false the service runs against `NullCache`
    pub cache_enabled: bool,

    /// Entry bound of the in-process cache
    pub cache_max_capacity: u64,

    /// Shared Redis cache; the in-process cache is used when unset
    pub redis_url: Option<String>,

    /// Deadline applied to every HTTP request
    pub request_timeout_seconds: u64,

    pub environment: Environment,
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Testing,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "testing" | "test" => Environment::Testing,
            _ => Environment::Development,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            base_url: "http://localhost:8080".to_string(),
            database_url: "sqlite://data/links.db?mode=rwc".to_string(),
            short_code_length: DEFAULT_CODE_LENGTH,
            cache_ttl_seconds: 86_400,
            cache_enabled: true,
            cache_max_capacity: crate::cache::DEFAULT_MAX_CAPACITY,
            redis_url: None,
            request_timeout_seconds: 30,
            environment: Environment::Development,
        }
    }
}

impl Config {
    /// Builds the config from environment variables.
    ///
    /// Unparseable numbers fall back to their defaults rather than failing;
    /// [`Config::validate`] catches values that parse but make no sense.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let get_env = |key: &str, default: &str| -> String {
            env::var(key).unwrap_or_else(|_| default.to_string())
        };

        let parse_env = |key: &str, default: u64| -> u64 {
            env::var(key)
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        let port = u16::try_from(parse_env("PORT", u64::from(defaults.port)))
            .map_err(|_| AppError::Config("PORT is out of range".to_string()))?;

        let cache_enabled = env::var("CACHE_ENABLED")
            .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(defaults.cache_enabled);

        let config = Self {
            host: get_env("HOST", &defaults.host),
            port,
            base_url: get_env("BASE_URL", &defaults.base_url),
            database_url: get_env("DATABASE_URL", &defaults.database_url),
            short_code_length: parse_env("SHORT_CODE_LENGTH", defaults.short_code_length as u64)
                as usize,
            cache_ttl_seconds: parse_env("CACHE_TTL", defaults.cache_ttl_seconds),
            cache_enabled,
            cache_max_capacity: parse_env("CACHE_MAX_CAPACITY", defaults.cache_max_capacity),
            redis_url: env::var("REDIS_URL")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            request_timeout_seconds: parse_env(
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_seconds,
            ),
            environment: get_env("ENVIRONMENT", "development").into(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(AppError::Config("PORT cannot be 0".to_string()));
        }

        if self.short_code_length == 0 || self.short_code_length > MAX_CODE_LENGTH {
            return Err(AppError::Config(format!(
                "SHORT_CODE_LENGTH must be between 1 and {}",
                MAX_CODE_LENGTH
            )));
        }

        if self.base_url.trim().is_empty() {
            return Err(AppError::Config("BASE_URL cannot be empty".to_string()));
        }

        if self.cache_enabled && self.cache_ttl_seconds == 0 {
            return Err(AppError::Config(
                "CACHE_TTL must be positive when caching is enabled".to_string(),
            ));
        }

        if self.cache_enabled && self.redis_url.is_none() && self.cache_max_capacity == 0 {
            return Err(AppError::Config(
                "CACHE_MAX_CAPACITY must be positive for the in-process cache".to_string(),
            ));
        }

        Ok(())
    }

    #[must_use]
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

// =====================================
// Builder Pattern
// =====================================
/// Fluent construction of a [`Config`].
///
/// ```rust
/// use link_shortener::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .port(9000)
///     .base_url("https://sho.rt")
///     .build();
/// assert_eq!(config.port, 9000);
/// ```
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = url.into();
        self
    }

    #[must_use]
    pub fn short_code_length(mut self, length: usize) -> Self {
        self.config.short_code_length = length;
        self
    }

    #[must_use]
    pub fn cache_ttl_seconds(mut self, seconds: u64) -> Self {
        self.config.cache_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.config.cache_enabled = enabled;
        self
    }

    #[must_use]
    pub fn cache_max_capacity(mut self, capacity: u64) -> Self {
        self.config.cache_max_capacity = capacity;
        self
    }

    #[must_use]
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.config.redis_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn environment(mut self, env: Environment) -> Self {
        self.config.environment = env;
        self
    }

    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }

    pub fn build_validated(self) -> Result<Config> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
