use crate::app_env;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default session lifetime: 7 days
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7);
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const MIN_JWT_SECRET_LEN: usize = 32;
/// Longest accepted session lifetime: 1 year
const MAX_SESSION_TTL_SECS: u64 = 60 * 60 * 24 * 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} was not set")]
    Missing(&'static str),
    #[error("environment variable {name} had an invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Where telemetry should be exported, if anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtelEndpoints {
    pub spans: String,
    pub metrics: String,
}

/// Settings the server needs at startup, read from the environment.
/// See [app_env] for the variable names.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub session_ttl: Duration,
    pub secure_cookies: bool,
    pub otel: Option<OtelEndpoints>,
}

impl AppConfig {
    /// Reads configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup(app_env::DB_URL).ok_or(ConfigError::Missing(app_env::DB_URL))?;

        let jwt_secret =
            lookup(app_env::JWT_SECRET).ok_or(ConfigError::Missing(app_env::JWT_SECRET))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                name: app_env::JWT_SECRET,
                reason: format!("must be at least {MIN_JWT_SECRET_LEN} bytes"),
            });
        }

        let bind_address = parse_or(
            &lookup,
            app_env::BIND_ADDRESS,
            SocketAddr::from(([0, 0, 0, 0], 8080)),
        )?;
        let db_max_connections =
            parse_or(&lookup, app_env::DB_MAX_CONNECTIONS, DEFAULT_DB_MAX_CONNECTIONS)?;
        let session_ttl_secs = parse_or(
            &lookup,
            app_env::SESSION_TTL_SECS,
            DEFAULT_SESSION_TTL.as_secs(),
        )?;
        if !(1..=MAX_SESSION_TTL_SECS).contains(&session_ttl_secs) {
            return Err(ConfigError::Invalid {
                name: app_env::SESSION_TTL_SECS,
                reason: format!("must be between 1 and {MAX_SESSION_TTL_SECS} seconds"),
            });
        }
        let session_ttl = Duration::from_secs(session_ttl_secs);
        let secure_cookies = parse_or(&lookup, app_env::SECURE_COOKIES, false)?;

        let otel = match (
            lookup(app_env::OTEL_SPAN_EXPORT_URL),
            lookup(app_env::OTEL_METRIC_EXPORT_URL),
        ) {
            (Some(spans), Some(metrics)) => Some(OtelEndpoints { spans, metrics }),
            _ => None,
        };

        Ok(AppConfig {
            bind_address,
            database_url,
            db_max_connections,
            jwt_secret,
            session_ttl,
            secure_cookies,
            otel,
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
            name,
            reason: err.to_string(),
        }),
    }
}
