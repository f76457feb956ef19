//! Service configuration.
//!
//! Values come from built-in defaults, then an optional `config.toml` with
//! `[server]`, `[database]` and `[log]` tables, then a fixed set of flat
//! environment variables that are mapped onto those tables.

use std::{
    net::{IpAddr, SocketAddr},
    time::Duration,
};

use anyhow::{ensure, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgPoolOptions, PgPool};

const CONFIG_FILE: &str = "config.toml";

/// Environment variables and the configuration paths they set.
const ENV_PATHS: &[(&str, &str)] = &[
    ("DATABASE_URL", "database.url"),
    ("DATABASE_MAX_CONNECTIONS", "database.max_connections"),
    ("DATABASE_MIN_CONNECTIONS", "database.min_connections"),
    ("DATABASE_CONNECTION_TIMEOUT", "database.connect_timeout_secs"),
    ("DATABASE_IDLE_TIMEOUT", "database.idle_timeout_secs"),
    ("DATABASE_MAX_LIFETIME", "database.max_lifetime_secs"),
    ("HOST", "server.host"),
    ("PORT", "server.port"),
    ("RUST_LOG", "log.filter"),
];

/// Complete service configuration.
///
/// ```no_run
/// use enrollment_api::Config;
///
/// let config = Config::load().expect("configuration");
/// println!("listening on {}", config.server.socket_addr().expect("address"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Store connection settings
    pub database: DatabaseConfig,
    /// Log output settings
    pub log: LogConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind, `HOST`
    pub host: String,
    /// Listening port, `PORT`
    pub port: u16,
}

/// PostgreSQL pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection string, `DATABASE_URL`
    pub url: String,
    /// Pool ceiling, `DATABASE_MAX_CONNECTIONS`
    pub max_connections: u32,
    /// Pool floor, `DATABASE_MIN_CONNECTIONS`
    pub min_connections: u32,
    /// Seconds to wait for a connection, `DATABASE_CONNECTION_TIMEOUT`
    pub connect_timeout_secs: u64,
    /// Seconds before an idle connection is closed, `DATABASE_IDLE_TIMEOUT`
    pub idle_timeout_secs: u64,
    /// Seconds before any connection is recycled, `DATABASE_MAX_LIFETIME`
    pub max_lifetime_secs: u64,
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter directive, `RUST_LOG`
    pub filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 5000 }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/enrollment".to_string(),
            max_connections: 10,
            min_connections: 0,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { filter: "info".to_string() }
    }
}

impl Config {
    /// Loads and validates configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns error if a source cannot be parsed or a value is out of range.
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment())
    }

    /// Layered sources in priority order, lowest first.
    pub fn figment() -> Figment {
        let keys: Vec<&str> = ENV_PATHS.iter().map(|(key, _)| *key).collect();

        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::raw().only(&keys).map(|key| {
                ENV_PATHS
                    .iter()
                    .find(|(env, _)| key.as_str().eq_ignore_ascii_case(env))
                    .map_or_else(|| key.into(), |(_, path)| (*path).into())
            }))
    }

    /// Extracts and validates configuration from `figment`.
    ///
    /// # Errors
    ///
    /// Returns error if extraction fails or a value is out of range.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.server.port > 0, "server port must be greater than 0");
        ensure!(
            self.database.max_connections > 0,
            "database max connections must be greater than 0"
        );
        ensure!(
            self.database.min_connections <= self.database.max_connections,
            "database min connections ({}) exceed max connections ({})",
            self.database.min_connections,
            self.database.max_connections
        );
        Ok(())
    }
}

impl ServerConfig {
    /// Socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns error if `host` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr =
            self.host.parse().with_context(|| format!("Invalid bind host {:?}", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl DatabaseConfig {
    /// Pool options reflecting these settings.
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(self.max_lifetime_secs))
    }

    /// Pool that opens connections on first use.
    ///
    /// Returns without touching the network, so the listener can come up
    /// while the database is still unreachable.
    ///
    /// # Errors
    ///
    /// Returns error if `url` is not a valid PostgreSQL connection string.
    pub fn connect_lazy(&self) -> Result<PgPool> {
        self.pool_options()
            .connect_lazy(&self.url)
            .with_context(|| format!("Invalid database URL {}", self.masked_url()))
    }

    /// Connection string with any password replaced by `***`.
    pub fn masked_url(&self) -> String {
        let Some((scheme, rest)) = self.url.split_once("://") else {
            return self.url.clone();
        };
        let authority_end = rest.find('/').unwrap_or(rest.len());
        let (authority, path) = rest.split_at(authority_end);

        match authority.rsplit_once('@') {
            Some((userinfo, host)) => match userinfo.split_once(':') {
                Some((user, _)) => format!("{scheme}://{user}:***@{host}{path}"),
                None => self.url.clone(),
            },
            None => self.url.clone(),
        }
    }
}
