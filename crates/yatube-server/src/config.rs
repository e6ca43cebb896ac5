use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use tracing::warn;

/// Placeholder JWT secrets that MUST NOT be used in release builds.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

const DEV_SECRET: &str = "dev-secret-change-me";

/// Server settings read from `YATUBE_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    jwt_secret: Option<String>,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub media_dir: PathBuf,
    pub page_size: usize,
    pub index_cache_ttl: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port: u16 = var("YATUBE_PORT", "8000")
            .parse()
            .context("YATUBE_PORT must be a port number")?;
        let page_size: usize = var("YATUBE_PAGE_SIZE", "10")
            .parse()
            .context("YATUBE_PAGE_SIZE must be a positive integer")?;
        if page_size == 0 {
            bail!("YATUBE_PAGE_SIZE must be a positive integer");
        }
        let cache_secs: u64 = var("YATUBE_INDEX_CACHE_SECS", "1200")
            .parse()
            .context("YATUBE_INDEX_CACHE_SECS must be a number of seconds")?;

        Ok(Self {
            jwt_secret: lookup("YATUBE_JWT_SECRET").filter(|s| !s.is_empty()),
            db_path: var("YATUBE_DB_PATH", "yatube.db").into(),
            host: var("YATUBE_HOST", "0.0.0.0"),
            port,
            media_dir: var("YATUBE_MEDIA_DIR", "./media").into(),
            page_size,
            index_cache_ttl: Duration::from_secs(cache_secs),
        })
    }

    /// The token signing secret. Debug builds fall back to a dev secret;
    /// release builds refuse to start without a real one.
    pub fn jwt_secret(&self) -> anyhow::Result<String> {
        match self.jwt_secret.as_deref() {
            Some(secret) if !PLACEHOLDER_SECRETS.contains(&secret) => Ok(secret.to_string()),
            _ if cfg!(debug_assertions) => {
                warn!("YATUBE_JWT_SECRET is unset or a placeholder; using the dev secret");
                Ok(DEV_SECRET.to_string())
            }
            _ => bail!("YATUBE_JWT_SECRET is unset or still a placeholder"),
        }
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
