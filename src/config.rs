//! Environment-driven service configuration

use std::env;

use crate::error::TrackerError;
use crate::Result;

pub const DEFAULT_PORT: u16 = 2006;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub port: u16,
    /// Postgres URL; the in-memory store is used when absent
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub session_ttl_hours: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment. Call `dotenv` first to pick up `.env`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, so tests need not touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT").or_else(|| lookup("API_PORT")) {
            Some(raw) => parse_setting("PORT", &raw)?,
            None => defaults.port,
        };

        let database_url = lookup("DATABASE_URL")
            .or_else(|| lookup("POSTGRES_URL"))
            .filter(|url| !url.trim().is_empty());

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => parse_setting("DB_MAX_CONNECTIONS", &raw)?,
            None => defaults.max_connections,
        };

        let session_ttl_hours = match lookup("SESSION_TTL_HOURS") {
            Some(raw) => parse_setting("SESSION_TTL_HOURS", &raw)?,
            None => defaults.session_ttl_hours,
        };
        if session_ttl_hours <= 0 {
            return Err(TrackerError::Config(
                "SESSION_TTL_HOURS must be positive".to_string(),
            ));
        }

        Ok(Self {
            port,
            database_url,
            max_connections,
            session_ttl_hours,
        })
    }
}

fn parse_setting<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| TrackerError::Config(format!("Invalid value for {}: {:?}", key, raw)))
}
