//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::DEFAULT_MAX_POINTS;

const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ORACLE_MAX_CONCURRENT: usize = 8;

/// Error reading configuration.
#[derive(Debug, thiserror::Error)]
#[error("invalid value {value:?} for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Everything `main` needs to assemble the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Directions API key. Without one the server routes in straight lines.
    pub api_key: Option<String>,

    /// Address to listen on
    pub bind_addr: SocketAddr,

    /// Directory for the file store. In-memory storage when unset.
    pub store_dir: Option<PathBuf>,

    /// Bound on each routing oracle call
    pub oracle_timeout: Duration,

    /// Maximum in-flight routing oracle calls
    pub oracle_max_concurrent: usize,

    /// Maximum points per request
    pub max_points: usize,
}

impl ServerConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`, treating blank values as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        Ok(Self {
            api_key: get("G_API_KEY"),
            bind_addr: parse_or(get("BIND_ADDR"), "BIND_ADDR", default_bind_addr)?,
            store_dir: get("STORE_DIR").map(PathBuf::from),
            oracle_timeout: Duration::from_secs(positive(
                parse_or(get("ORACLE_TIMEOUT_SECS"), "ORACLE_TIMEOUT_SECS", || {
                    DEFAULT_ORACLE_TIMEOUT_SECS
                })?,
                "ORACLE_TIMEOUT_SECS",
            )?),
            oracle_max_concurrent: positive(
                parse_or(get("ORACLE_MAX_CONCURRENT"), "ORACLE_MAX_CONCURRENT", || {
                    DEFAULT_ORACLE_MAX_CONCURRENT
                })?,
                "ORACLE_MAX_CONCURRENT",
            )?,
            max_points: positive(
                parse_or(get("MAX_POINTS"), "MAX_POINTS", || DEFAULT_MAX_POINTS)?,
                "MAX_POINTS",
            )?,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            bind_addr: default_bind_addr(),
            store_dir: None,
            oracle_timeout: Duration::from_secs(DEFAULT_ORACLE_TIMEOUT_SECS),
            oracle_max_concurrent: DEFAULT_ORACLE_MAX_CONCURRENT,
            max_points: DEFAULT_MAX_POINTS,
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn parse_or<T>(
    value: Option<String>,
    var: &'static str,
    default: impl FnOnce() -> T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default()),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

fn positive<T>(n: T, var: &'static str) -> Result<T, ConfigError>
where
    T: Copy + Default + PartialEq + std::fmt::Display,
{
    if n == T::default() {
        return Err(ConfigError {
            var,
            value: n.to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(n)
}
