//! Runtime configuration, resolved once at startup and handed to the
//! components that need it.

use std::env;
use std::fmt;
use std::time::Duration;

use reqwest::Url;

use crate::error::ConfigError;

pub const DEFAULT_COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Postgres connection parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl DatabaseConfig {
    /// Read `POSTGRES_HOST`, `POSTGRES_PORT`, `POSTGRES_DB`, `POSTGRES_USER`
    /// and `POSTGRES_PASSWORD`. Only the port has a default (5432).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingDatabaseSetting { name })
        };

        let port = match lookup("POSTGRES_PORT").filter(|p| !p.is_empty()) {
            None => 5432,
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidDatabaseSetting {
                    name: "POSTGRES_PORT",
                    value,
                })?,
        };

        Ok(Self {
            host: require("POSTGRES_HOST")?,
            port,
            database: require("POSTGRES_DB")?,
            user: require("POSTGRES_USER")?,
            password: require("POSTGRES_PASSWORD")?,
        })
    }

    /// Connection URL with user, password and database name percent-encoded.
    pub fn url(&self) -> Result<String, ConfigError> {
        let invalid = |name: &'static str, value: &str| ConfigError::InvalidDatabaseSetting {
            name,
            value: value.to_string(),
        };

        let mut url = Url::parse(&format!("postgres://{}:{}", self.host, self.port))
            .map_err(|_| invalid("POSTGRES_HOST", &self.host))?;

        url.set_username(&self.user)
            .map_err(|_| invalid("POSTGRES_USER", &self.user))?;
        url.set_password(Some(&self.password))
            .map_err(|_| invalid("POSTGRES_PASSWORD", "***"))?;
        url.path_segments_mut()
            .map_err(|_| invalid("POSTGRES_DB", &self.database))?
            .push(&self.database);

        Ok(url.to_string())
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Resolve the connection URL: an explicit `DATABASE_URL` wins, otherwise
/// the individual `POSTGRES_*` settings are assembled.
pub fn database_url(explicit: Option<String>) -> Result<String, ConfigError> {
    match explicit.filter(|url| !url.is_empty()) {
        Some(url) => Ok(url),
        None => DatabaseConfig::from_env()?.url(),
    }
}

/// CoinGecko client settings.
#[derive(Clone)]
pub struct CoinGeckoConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_COINGECKO_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl fmt::Debug for CoinGeckoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoinGeckoConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .finish()
    }
}
