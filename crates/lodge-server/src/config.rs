use std::env;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Result, bail};
use tracing::info;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

impl Config {
    /// Reads `LODGE_*` variables. Call after `.env` has been loaded.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = lookup("LODGE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("LODGE_JWT_SECRET is unset or still a placeholder; set it in .env and restart");
        }

        let host: IpAddr = parse_or(&lookup, "LODGE_HOST", "0.0.0.0")?;
        let port: u16 = parse_or(&lookup, "LODGE_PORT", "3000")?;
        let addr = SocketAddr::new(host, port);

        let token_ttl_days: i64 = parse_or(&lookup, "LODGE_TOKEN_TTL_DAYS", "30")?;
        if !(1..=365).contains(&token_ttl_days) {
            bail!("LODGE_TOKEN_TTL_DAYS must be between 1 and 365");
        }

        Ok(Self {
            addr,
            db_path: parse_or(&lookup, "LODGE_DB_PATH", "lodge.db")?,
            jwt_secret,
            token_ttl_days,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e| anyhow::anyhow!("invalid {key} value '{raw}': {e}"))
}
