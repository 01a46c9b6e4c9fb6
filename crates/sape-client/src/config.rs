//! Client configuration loaded from environment variables.
//!
//! Every setting has a default, so an empty environment yields a working
//! local-storage client pointed at the emulator's host address.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sape_api::ApiConfig;
use sape_shared::constants::{DEFAULT_API_URL, DEFAULT_HTTP_TIMEOUT_SECS};

/// Where sports and places are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// JSON blobs in the on-device key-value store.
    #[default]
    Local,
    /// The REST backend.
    Remote,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" | "api" => Ok(Self::Remote),
            other => Err(format!("unknown backend: {other}")),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Remote => "remote",
        })
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST base URL.
    /// Env: `SAPE_API_URL`
    pub api_url: String,

    /// Whole-request HTTP timeout.
    /// Env: `SAPE_HTTP_TIMEOUT_SECS`
    pub http_timeout: Duration,

    /// Backend for the sport and place stores.
    /// Env: `SAPE_BACKEND` (`local` | `remote`)
    pub backend: BackendKind,

    /// Directory holding the database file. `None` means the platform data
    /// directory.
    /// Env: `SAPE_DATA_DIR`
    pub data_dir: Option<PathBuf>,

    /// Exact database file; wins over `data_dir`.
    /// Env: `SAPE_DB_PATH`
    pub db_path: Option<PathBuf>,

    /// Upper bound on a place's capacity, checked when saving a place.
    /// Env: `SAPE_MAX_PLACE_CAPACITY`
    /// Default: none.
    pub max_place_capacity: Option<u32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            backend: BackendKind::Local,
            data_dir: None,
            db_path: None,
            max_place_capacity: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the process environment, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = var("SAPE_API_URL") {
            config.api_url = url.trim().to_string();
        }

        if let Some(val) = var("SAPE_HTTP_TIMEOUT_SECS") {
            match val.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.http_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %val, "Invalid SAPE_HTTP_TIMEOUT_SECS, using default"),
            }
        }

        if let Some(val) = var("SAPE_BACKEND") {
            match val.parse::<BackendKind>() {
                Ok(kind) => config.backend = kind,
                Err(e) => tracing::warn!(error = %e, "Invalid SAPE_BACKEND, using local"),
            }
        }

        if let Some(dir) = var("SAPE_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(path) = var("SAPE_DB_PATH") {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Some(val) = var("SAPE_MAX_PLACE_CAPACITY") {
            match val.trim().parse::<u32>() {
                Ok(max) if max > 0 => config.max_place_capacity = Some(max),
                _ => tracing::warn!(value = %val, "Invalid SAPE_MAX_PLACE_CAPACITY, ignoring"),
            }
        }

        config
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api_url.clone(),
            timeout: self.http_timeout,
        }
    }
}
