//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! The first existing file wins:
//! 1. `--config <path>` (must exist)
//! 2. `$TOKENREG_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/tokenreg/config.toml`
//! 4. `~/.tokenreg/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use tokenreg::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("Server port: {}", config.server_port());
//! println!("Client target: {}:{}", config.client_host(), config.client_port());
//! ```

pub mod schema;

pub use schema::{ConfigFile, EndpointConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default port, shared by server and client.
pub const DEFAULT_PORT: u16 = 50051;

/// Default address the server binds to.
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default host the client connects to.
pub const DEFAULT_CLIENT_HOST: &str = "localhost";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "TOKENREG_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config file '{0}' does not exist")]
    NotFound(PathBuf),

    #[error("config file '{0}' already exists")]
    AlreadyExists(PathBuf),

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration.
///
/// Accessors apply defaults for anything the file leaves unset.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents
    pub file: ConfigFile,
    /// Path the file was loaded from, if any
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise the standard locations are
    /// searched and a missing file means defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated, or if `explicit` points at a missing file.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from(path);
        }

        let candidates = candidate_paths(
            std::env::var_os(CONFIG_ENV).map(PathBuf::from),
            std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
            dirs::home_dir(),
        );

        match candidates.into_iter().find(|p| p.exists()) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Wrap already-parsed contents (not associated with any path).
    pub fn from_file(file: ConfigFile) -> Self {
        Self { file, path: None }
    }

    /// Load and validate a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        file.validate()?;

        Ok(Self {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    /// Get the canonical config path, `~/.tokenreg/config.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".tokenreg/config.toml"))
    }

    /// Write a config file atomically.
    ///
    /// Creates parent directories if needed. Refuses to overwrite an
    /// existing file unless `force` is set.
    pub fn write(path: &Path, file: &ConfigFile, force: bool) -> Result<(), ConfigError> {
        file.validate()?;

        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(file).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        // Write to temp file in same directory (for atomic rename)
        let temp_path = path.with_extension("toml.tmp");
        let mut handle = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        handle
            .write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        handle.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// A fully-populated file holding the built-in defaults.
    pub fn defaults_file() -> ConfigFile {
        ConfigFile {
            server: Some(EndpointConfig {
                host: Some(DEFAULT_SERVER_HOST.to_string()),
                port: Some(DEFAULT_PORT),
            }),
            client: Some(EndpointConfig {
                host: Some(DEFAULT_CLIENT_HOST.to_string()),
                port: Some(DEFAULT_PORT),
            }),
        }
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Address the server binds to.
    ///
    /// Defaults to "0.0.0.0".
    pub fn server_host(&self) -> &str {
        self.file
            .server
            .as_ref()
            .and_then(|s| s.host.as_deref())
            .unwrap_or(DEFAULT_SERVER_HOST)
    }

    /// Port the server binds to.
    ///
    /// Defaults to 50051.
    pub fn server_port(&self) -> u16 {
        self.file
            .server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_PORT)
    }

    /// Host the client connects to.
    ///
    /// Defaults to "localhost".
    pub fn client_host(&self) -> &str {
        self.file
            .client
            .as_ref()
            .and_then(|c| c.host.as_deref())
            .unwrap_or(DEFAULT_CLIENT_HOST)
    }

    /// Port the client connects to.
    ///
    /// Defaults to 50051.
    pub fn client_port(&self) -> u16 {
        self.file
            .client
            .as_ref()
            .and_then(|c| c.port)
            .unwrap_or(DEFAULT_PORT)
    }

    /// Path the configuration was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Standard config locations, in search order.
fn candidate_paths(
    env_path: Option<PathBuf>,
    xdg_home: Option<PathBuf>,
    home: Option<PathBuf>,
) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(path) = env_path {
        paths.push(path);
    }
    if let Some(xdg) = xdg_home {
        paths.push(xdg.join("tokenreg/config.toml"));
    }
    if let Some(home) = home {
        paths.push(home.join(".tokenreg/config.toml"));
    }
    paths
}
