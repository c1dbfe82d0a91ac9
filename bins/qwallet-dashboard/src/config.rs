//! Dashboard configuration loaded from environment variables.

use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8090";

#[derive(Clone, Debug)]
pub struct Config {
    /// Address to bind the HTTP server.
    pub bind_addr: String,
    /// Optional session config file (TOML).
    pub session_config: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_addr = lookup("DASHBOARD_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        bind_addr
            .parse::<std::net::SocketAddr>()
            .with_context(|| format!("DASHBOARD_BIND_ADDR is not a socket address: {bind_addr}"))?;

        let session_config = lookup("DASHBOARD_CONFIG")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(Config {
            bind_addr,
            session_config,
        })
    }
}
