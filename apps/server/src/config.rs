use anyhow::{bail, Context};
use std::{net::SocketAddr, time::Duration};

use trackmybudget_storage_sqlite::{DEFAULT_POOL_SIZE, MIN_POOL_SIZE};

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub db_pool_size: u32,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    /// Reads `TMB_*` variables, loading a `.env` file first when present.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = std::env::var("TMB_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .context("Invalid TMB_LISTEN_ADDR")?;
        let db_path = std::env::var("TMB_DB_PATH").unwrap_or_else(|_| "./db/app.db".into());
        let db_pool_size = parse_pool_size(std::env::var("TMB_DB_POOL_SIZE").ok())?;
        let cors_allow = std::env::var("TMB_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = std::env::var("TMB_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".into())
            .parse()
            .context("Invalid TMB_REQUEST_TIMEOUT_MS")?;
        let log_format = match std::env::var("TMB_LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };
        Ok(Self {
            listen_addr,
            db_path,
            db_pool_size,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            log_format,
        })
    }
}

/// The writer holds one pooled connection for its lifetime, so the pool needs
/// at least one more for request reads.
fn parse_pool_size(raw: Option<String>) -> anyhow::Result<u32> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_POOL_SIZE);
    };
    let size: u32 = raw.trim().parse().context("Invalid TMB_DB_POOL_SIZE")?;
    if size < MIN_POOL_SIZE {
        bail!(
            "Invalid TMB_DB_POOL_SIZE: {} is below the minimum of {}",
            size,
            MIN_POOL_SIZE
        );
    }
    Ok(size)
}
