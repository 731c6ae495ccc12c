use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::leave::{DEFAULT_ANNUAL_CAP_DAYS, DEFAULT_ENTITLEMENT_DAYS, LeavePolicy};

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    /// Without it the service keeps everything in memory
    pub database_url: Option<String>,
    pub api_prefix: String,

    // Rate limiting, 0 turns it off
    pub rate_per_min: u32,

    // Leave policy
    pub annual_cap_days: u32,
    pub default_entitlement_days: u32,

    // Logging
    pub log_dir: String,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            rate_per_min: parse_var("RATE_PER_MIN", 1000)?,

            annual_cap_days: parse_var("LEAVE_ANNUAL_CAP_DAYS", DEFAULT_ANNUAL_CAP_DAYS)?,
            default_entitlement_days: parse_var(
                "DEFAULT_ENTITLEMENT_DAYS",
                DEFAULT_ENTITLEMENT_DAYS,
            )?,

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn leave_policy(&self) -> LeavePolicy {
        LeavePolicy {
            annual_cap_days: self.annual_cap_days,
            default_entitlement_days: self.default_entitlement_days,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8080".to_string(),
            database_url: None,
            api_prefix: "/api".to_string(),
            rate_per_min: 1000,
            annual_cap_days: DEFAULT_ANNUAL_CAP_DAYS,
            default_entitlement_days: DEFAULT_ENTITLEMENT_DAYS,
            log_dir: "logs".to_string(),
            log_level: "info".to_string(),
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number, got {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}
