//! Service configuration read from environment variables.

use crate::time_utils::CivilZone;
use std::env;

pub mod defaults {
    pub const PORT: u16 = 8001;
    pub const DB_MAX_CONNECTIONS: u32 = 10;
    pub const TIMEZONE: &str = "UTC+7";
    pub const CORS_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";
    pub const FACE_ATTEMPTS_PER_MINUTE: usize = 5;
    pub const OVERDUE_SWEEP_CRON: &str = "0 */15 * * * *";
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    /// Zone that defines calendar days and the lateness cutoff.
    pub zone: CivilZone,
    pub cors_allowed_origins: Vec<String>,
    pub dashboard_demo_fallback: bool,
    pub face_attempts_per_minute: usize,
    pub overdue_sweep_cron: String,
}

impl AppConfig {
    /// Environment variables:
    /// - `DATABASE_URL`: Postgres connection string (required)
    /// - `BIND_ADDR`: listen address; otherwise `0.0.0.0:$PORT` (default 8001)
    /// - `DB_MAX_CONNECTIONS`: pool size (default 10)
    /// - `ATTENDANCE_TIMEZONE`: fixed offset like `UTC+7` or an IANA name
    /// - `CORS_ALLOWED_ORIGINS`: comma-separated origins
    /// - `DASHBOARD_DEMO_FALLBACK`: `true` to fill empty dashboards with demo data
    /// - `FACE_ATTEMPTS_PER_MINUTE`: check-in attempts per user per minute (default 5)
    /// - `OVERDUE_SWEEP_CRON`: six-field cron schedule for the overdue sweep
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::MissingEnvVar("DATABASE_URL"))?;

        let bind_addr = match get("BIND_ADDR") {
            Some(addr) => addr,
            None => {
                let port = match get("PORT") {
                    Some(raw) => raw
                        .trim()
                        .parse::<u16>()
                        .map_err(|_| ConfigError::InvalidValue("PORT must be a valid port number"))?,
                    None => defaults::PORT,
                };
                format!("0.0.0.0:{}", port)
            }
        };

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue(
                    "DB_MAX_CONNECTIONS must be a positive number",
                ))?,
            None => defaults::DB_MAX_CONNECTIONS,
        };

        let zone_raw = get("ATTENDANCE_TIMEZONE").unwrap_or_else(|| defaults::TIMEZONE.to_string());
        let zone = CivilZone::parse(&zone_raw).ok_or(ConfigError::InvalidValue(
            "ATTENDANCE_TIMEZONE must be an offset like UTC+7 or an IANA zone name",
        ))?;

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| defaults::CORS_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let dashboard_demo_fallback = match get("DASHBOARD_DEMO_FALLBACK") {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidValue(
                "DASHBOARD_DEMO_FALLBACK must be true or false",
            ))?,
            None => false,
        };

        let face_attempts_per_minute = match get("FACE_ATTEMPTS_PER_MINUTE") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue(
                    "FACE_ATTEMPTS_PER_MINUTE must be a positive number",
                ))?,
            None => defaults::FACE_ATTEMPTS_PER_MINUTE,
        };

        let overdue_sweep_cron =
            get("OVERDUE_SWEEP_CRON").unwrap_or_else(|| defaults::OVERDUE_SWEEP_CRON.to_string());

        Ok(Self {
            database_url,
            bind_addr,
            db_max_connections,
            zone,
            cors_allowed_origins,
            dashboard_demo_fallback,
            face_attempts_per_minute,
            overdue_sweep_cron,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/hr")]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8001");
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.zone, CivilZone::wib());
        assert_eq!(config.cors_allowed_origins.len(), 2);
        assert!(!config.dashboard_demo_fallback);
        assert_eq!(config.face_attempts_per_minute, 5);
        assert_eq!(config.overdue_sweep_cron, "0 */15 * * * *");
    }

    #[test]
    fn database_url_is_required() {
        assert!(matches!(
            load(&[]),
            Err(ConfigError::MissingEnvVar("DATABASE_URL"))
        ));
    }

    #[test]
    fn bind_addr_wins_over_port() {
        let config = load(&[
            ("DATABASE_URL", "postgres://x"),
            ("PORT", "9000"),
            ("BIND_ADDR", "127.0.0.1:7000"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:7000");

        let config = load(&[("DATABASE_URL", "postgres://x"), ("PORT", "9000")]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(load(&[("DATABASE_URL", "postgres://x"), ("PORT", "http")]).is_err());
        assert!(load(&[("DATABASE_URL", "postgres://x"), ("ATTENDANCE_TIMEZONE", "Nowhere/City")]).is_err());
        assert!(matches!(
            load(&[("DATABASE_URL", "postgres://x"), ("ATTENDANCE_TIMEZONE", "+1éa")]),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(load(&[("DATABASE_URL", "postgres://x"), ("DASHBOARD_DEMO_FALLBACK", "maybe")]).is_err());
        assert!(load(&[("DATABASE_URL", "postgres://x"), ("FACE_ATTEMPTS_PER_MINUTE", "0")]).is_err());
    }

    #[test]
    fn named_zone_and_flag() {
        let config = load(&[
            ("DATABASE_URL", "postgres://x"),
            ("ATTENDANCE_TIMEZONE", "Asia/Makassar"),
            ("DASHBOARD_DEMO_FALLBACK", "TRUE"),
        ])
        .unwrap();
        assert_eq!(config.zone, CivilZone::Named(chrono_tz::Asia::Makassar));
        assert!(config.dashboard_demo_fallback);
    }
}
