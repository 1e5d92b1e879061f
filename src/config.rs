//! Server configuration
//!
//! Defaults, overridden by an optional JSON file, overridden by command-line
//! flags.

use clap::Parser;
use serde::Deserialize;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Port used when none is configured
pub const DEFAULT_PORT: u16 = 3000;

/// Listen backlog used when none is configured
pub const DEFAULT_BACKLOG: i32 = 5;

/// Readiness wait ceiling used when none is configured
pub const DEFAULT_TICK_MS: u64 = 15_000;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind, any-address by default
    pub bind: Ipv4Addr,

    /// Port to listen on
    pub port: u16,

    /// Listen backlog
    pub backlog: i32,

    /// Upper bound of one readiness wait, in milliseconds
    ///
    /// A scheduling tick only, idle clients are never disconnected.
    pub tick_ms: u64,

    /// Default log filter when RUST_LOG is not set
    pub log_level: String,
}

impl ServerConfig {
    /// Socket address to bind
    pub fn addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.bind, self.port)
    }

    /// Readiness wait ceiling
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Parse a configuration from JSON, missing fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: Ipv4Addr::UNSPECIFIED,
            port: DEFAULT_PORT,
            backlog: DEFAULT_BACKLOG,
            tick_ms: DEFAULT_TICK_MS,
            log_level: "info".to_string(),
        }
    }
}

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Port to listen on
    pub port: Option<u16>,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// IPv4 address to bind
    #[arg(long)]
    pub bind: Option<Ipv4Addr>,

    /// Listen backlog
    #[arg(long)]
    pub backlog: Option<i32>,

    /// Readiness wait ceiling in milliseconds
    #[arg(long)]
    pub tick_ms: Option<u64>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Resolve the final configuration
    pub fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_json_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(backlog) = self.backlog {
            config.backlog = backlog;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_ms = tick_ms;
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level;
        }

        Ok(config)
    }
}
