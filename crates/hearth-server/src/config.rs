use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

const DEV_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub request_timeout: Duration,
    pub cascade_workers: usize,
}

impl ServerConfig {
    /// Read `HEARTH_*` variables, falling back to development defaults.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = std::env::var("HEARTH_JWT_SECRET").unwrap_or_else(|_| {
            warn!("HEARTH_JWT_SECRET not set, using the development secret");
            DEV_SECRET.into()
        });
        let db_path = PathBuf::from(var_or("HEARTH_DB_PATH", "hearth.db"));
        let host = var_or("HEARTH_HOST", "0.0.0.0");
        let port: u16 = parse_var("HEARTH_PORT", 3000)?;
        let timeout_ms: u64 = parse_var("HEARTH_REQUEST_TIMEOUT_MS", 5000)?;
        let cascade_workers: usize = parse_var("HEARTH_CASCADE_WORKERS", 4)?;

        let addr = format!("{host}:{port}")
            .parse()
            .with_context(|| format!("invalid listen address {host}:{port}"))?;

        Ok(Self {
            jwt_secret,
            db_path,
            addr,
            request_timeout: Duration::from_millis(timeout_ms),
            cascade_workers: cascade_workers.max(1),
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{name} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}
