//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;

use thiserror::Error;

pub const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set when USE_PERSISTENT_STORES=true")]
    Missing(&'static str),
}

/// Settings for the API process.
///
/// | Env var                    | Default          |
/// |----------------------------|------------------|
/// | `BIND_ADDR`                | `0.0.0.0:8080`   |
/// | `JWT_SECRET`               | `dev-secret`     |
/// | `TOKEN_TTL_MINUTES`        | `60`             |
/// | `USE_PERSISTENT_STORES`    | `false`          |
/// | `DATABASE_URL`             | required if persistent |
/// | `DATABASE_MAX_CONNECTIONS` | `10`             |
/// | `REALTIME_CAPACITY`        | `256`            |
/// | `ADMIN_EMAILS`             | empty            |
///
/// `ADMIN_EMAILS` is a comma-separated list; accounts signing up with one of
/// these addresses get the admin role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub realtime_capacity: usize,
    pub admin_emails: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_minutes: 60,
            use_persistent_stores: false,
            database_url: None,
            database_max_connections: 10,
            realtime_capacity: 256,
            admin_emails: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                defaults.jwt_secret
            }
        };

        let use_persistent_stores = parse_or(&lookup, "USE_PERSISTENT_STORES", defaults.use_persistent_stores)?;
        let database_url = lookup("DATABASE_URL").filter(|s| !s.is_empty());
        if use_persistent_stores && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let token_ttl_minutes = parse_or(&lookup, "TOKEN_TTL_MINUTES", defaults.token_ttl_minutes)?;
        if token_ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                var: "TOKEN_TTL_MINUTES",
                value: token_ttl_minutes.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            bind_addr: parse_or(&lookup, "BIND_ADDR", defaults.bind_addr)?,
            jwt_secret,
            token_ttl_minutes,
            use_persistent_stores,
            database_url,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", defaults.database_max_connections)?,
            realtime_capacity: parse_or(&lookup, "REALTIME_CAPACITY", defaults.realtime_capacity)?,
            admin_emails: lookup("ADMIN_EMAILS").map(|raw| split_emails(&raw)).unwrap_or_default(),
        })
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.token_ttl_minutes)
    }
}

fn split_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
