use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

use crate::engine::AttendancePolicy;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,

    /// Office hours used for status and overtime; fixed, not read from env
    pub policy: AttendancePolicy,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{} must be set", key))
}

fn or_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            db_max_connections: or_default("DB_MAX_CONNECTIONS", 10)?,
            access_token_ttl: or_default("ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: or_default("REFRESH_TOKEN_TTL", 604_800)?, // 7 days

            rate_login_per_min: or_default("RATE_LOGIN_PER_MIN", 60)?,
            rate_refresh_per_min: or_default("RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: or_default("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),

            policy: AttendancePolicy::default(),
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: "mysql://localhost/attendance_test".to_string(),
            db_max_connections: 1,
            jwt_secret: "test-secret".to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            access_token_ttl: 900,
            refresh_token_ttl: 3600,
            rate_login_per_min: 60,
            rate_refresh_per_min: 30,
            rate_protected_per_min: 1000,
            api_prefix: "/api".to_string(),
            log_dir: "logs".to_string(),
            policy: AttendancePolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_fall_back_to_defaults() {
        let ttl: usize = or_default("ATTENDANCE_TEST_UNSET_TTL", 900).unwrap();
        assert_eq!(ttl, 900);
    }

    #[test]
    fn missing_required_value_names_the_variable() {
        let err = required("ATTENDANCE_TEST_UNSET_REQUIRED").unwrap_err();
        assert!(err.to_string().contains("ATTENDANCE_TEST_UNSET_REQUIRED"));
    }
}
