use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub attachment_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} must be set"));
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let rate_protected_per_min = or_default("RATE_PROTECTED_PER_MIN", "1000")
            .parse()
            .context("RATE_PROTECTED_PER_MIN must be a non-negative integer")?;

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            rate_protected_per_min,
            api_prefix: or_default("API_PREFIX", "/api"),
            attachment_dir: or_default("ATTACHMENT_DIR", "uploads/leave").into(),
            log_dir: or_default("LOG_DIR", "logs").into(),
        })
    }
}
