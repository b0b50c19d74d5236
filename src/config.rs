use std::net::IpAddr;
use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;

use crate::analytics::rollup::RollupConfig;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub session_ttl: Duration,
    pub cookie_secure: bool,
    pub rollup: RollupConfig,
    pub max_upload_bytes: usize,
    pub seed_demo_users: bool,
    pub cors_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let session_ttl_hours: i64 = parse_or(&lookup, "SESSION_TTL_HOURS", 24)?;
        if session_ttl_hours <= 0 {
            return Err(invalid("SESSION_TTL_HOURS", session_ttl_hours));
        }

        let horizon_days: u32 = parse_or(&lookup, "ROLLUP_DAYS", 3)?;
        if horizon_days == 0 {
            return Err(invalid("ROLLUP_DAYS", horizon_days));
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            host: parse_or(&lookup, "HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parse_or(&lookup, "PORT", 3000)?,
            session_ttl: Duration::hours(session_ttl_hours),
            cookie_secure: flag_or(&lookup, "COOKIE_SECURE", false)?,
            rollup: RollupConfig {
                horizon_days,
                clamp_floor: parse_or(&lookup, "ROLLUP_CLAMP_FLOOR", 0)?,
                clamp_display: flag_or(&lookup, "ROLLUP_CLAMP", true)?,
            },
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            seed_demo_users: flag_or(&lookup, "SEED_DEMO_USERS", false)?,
            cors_origin: lookup("CORS_ORIGIN").filter(|v| !v.trim().is_empty()),
        })
    }
}

fn invalid(key: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid { key, value: value.to_string() }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| invalid(key, raw)),
        _ => Ok(default),
    }
}

fn flag_or<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(invalid(key, v)),
        },
    }
}
