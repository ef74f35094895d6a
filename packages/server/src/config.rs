//! Server configuration
//!
//! Read once from the environment at startup. Everything the engine itself
//! needs is carried in the embedded [`TreeConfig`].

use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;

use axum::http::HeaderValue;
use navtree_core::TreeConfig;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Vite dev server origins allowed when `CORS_ALLOW_ORIGIN` is unset
const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://localhost:1420"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}'")]
    InvalidVar { var: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine home directory; set NAVTREE_DATA_PATH")]
    NoHomeDir,
}

/// Backing store selected by `NAVTREE_STORE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    File,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StoreKind::File),
            "memory" => Ok(StoreKind::Memory),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub store: StoreKind,
    /// JSON file used when `store` is `File`
    pub data_path: PathBuf,
    pub cors_origins: Vec<String>,
    pub tree: TreeConfig,
}

impl ServerConfig {
    /// Build from process environment variables
    ///
    /// - `NAVTREE_PORT` (default 3001)
    /// - `NAVTREE_BIND` (default 127.0.0.1)
    /// - `NAVTREE_STORE`: `file` | `memory` (default file)
    /// - `NAVTREE_DATA_PATH` (default `~/.navtree/tree.json`)
    /// - `CORS_ALLOW_ORIGIN`: comma-separated origins
    /// - `NAVTREE_STORE_TIMEOUT_MS` (default 5000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`ServerConfig::from_env`] with an injectable variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parse_var(&lookup, "NAVTREE_PORT")?.unwrap_or(DEFAULT_PORT);
        let bind = match parse_var(&lookup, "NAVTREE_BIND")? {
            Some(bind) => bind,
            None => IpAddr::from_str(DEFAULT_BIND)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?,
        };

        let store = match lookup("NAVTREE_STORE") {
            Some(value) => value.parse::<StoreKind>().map_err(|value| ConfigError::InvalidVar {
                var: "NAVTREE_STORE",
                value,
            })?,
            None => StoreKind::File,
        };

        let data_path = match lookup("NAVTREE_DATA_PATH") {
            Some(path) => PathBuf::from(path),
            None => dirs::home_dir()
                .ok_or(ConfigError::NoHomeDir)?
                .join(".navtree")
                .join("tree.json"),
        };

        let cors_origins = match lookup("CORS_ALLOW_ORIGIN") {
            Some(origins) => origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        let mut tree = TreeConfig::default();
        if let Some(timeout) = parse_var(&lookup, "NAVTREE_STORE_TIMEOUT_MS")? {
            tree.store_timeout_ms = timeout;
        }

        Ok(Self {
            bind,
            port,
            store,
            data_path,
            cors_origins,
            tree,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be greater than 0".to_string()));
        }

        if self.store == StoreKind::File && self.data_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data path cannot be empty".to_string()));
        }

        for origin in &self.cors_origins {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| ConfigError::InvalidVar {
                    var: "CORS_ALLOW_ORIGIN",
                    value: origin.clone(),
                })?;
        }

        self.tree.validate().map_err(ConfigError::Invalid)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidVar { var, value })
        })
        .transpose()
}
