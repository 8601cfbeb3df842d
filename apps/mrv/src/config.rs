//! # Configuration
//!
//! Optional `mrv.toml` file plus environment overrides.
//!
//! ```toml
//! database = "data/carbon_registry.redb"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! api_key = "secret"
//! cors_origins = ["http://localhost:3000"]
//! rate_limit = 100
//!
//! [log]
//! format = "json"
//! ```
//!
//! ## Precedence
//!
//! CLI flags, then environment (`MRV_API_KEY`, `MRV_CORS_ORIGINS`,
//! `MRV_RATE_LIMIT`, `MRV_LOG_FORMAT`), then the file, then defaults.

use mrv_core::MrvError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file read from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "mrv.toml";

/// Store path used when neither the CLI nor the file names one.
pub const DEFAULT_DATABASE: &str = "data/carbon_registry.redb";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

/// Default rate limit in requests per second. Zero disables limiting.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

// =============================================================================
// FILE SCHEMA
// =============================================================================

/// Contents of `mrv.toml`. Every key is optional; unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MrvConfig {
    pub database: Option<PathBuf>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub api_key: Option<String>,
    pub cors_origins: Option<Vec<String>>,
    pub rate_limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// `text` or `json`.
    pub format: Option<String>,
}

impl MrvConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `mrv.toml` in the working
    /// directory is read if present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, MrvError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, MrvError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            MrvError::Config(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        Self::parse(&raw)
            .map_err(|e| MrvError::Config(format!("Invalid '{}': {}", path.display(), e)))
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Store path: the CLI flag wins over the file.
    #[must_use]
    pub fn database_path(&self, cli: Option<&Path>) -> PathBuf {
        cli.map(Path::to_path_buf)
            .or_else(|| self.database.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE))
    }

    /// Log format: `MRV_LOG_FORMAT` wins over the file.
    #[must_use]
    pub fn log_format(&self) -> String {
        std::env::var("MRV_LOG_FORMAT")
            .ok()
            .or_else(|| self.log.format.clone())
            .unwrap_or_else(|| "text".to_string())
    }
}

// =============================================================================
// RESOLVED SERVER SETTINGS
// =============================================================================

/// Server settings after every override has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Bearer key; `None` disables authentication.
    pub api_key: Option<String>,
    /// Allowed origins; `None` means localhost only, `["*"]` allows all.
    pub cors_origins: Option<Vec<String>>,
    pub rate_limit: u32,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_key: None,
            cors_origins: None,
            rate_limit: DEFAULT_RATE_LIMIT,
        }
    }
}

impl ServerSettings {
    /// Resolve against the process environment.
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::resolve(config, |name| std::env::var(name).ok())
    }

    /// Resolve with an explicit environment lookup.
    pub fn resolve(config: &ServerConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = env("MRV_API_KEY")
            .or_else(|| config.api_key.clone())
            .filter(|k| !k.is_empty());

        let cors_origins = env("MRV_CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .or_else(|| config.cors_origins.clone());

        let rate_limit = env("MRV_RATE_LIMIT")
            .and_then(|s| s.parse().ok())
            .or(config.rate_limit)
            .unwrap_or(DEFAULT_RATE_LIMIT);

        Self {
            host: config
                .host
                .clone()
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: config.port.unwrap_or(DEFAULT_PORT),
            api_key,
            cors_origins,
            rate_limit,
        }
    }

    /// Apply `--host` / `--port` from the command line.
    #[must_use]
    pub fn with_overrides(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// TESTS
// =============================================================================
