//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Example
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 50051
//!
//! [client]
//! host = "localhost"
//! port = 50051
//! ```
//!
//! # Validation
//!
//! Config values are validated after parsing: hosts cannot be empty and
//! ports cannot be 0.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Settings for `tokenreg serve`
    pub server: Option<EndpointConfig>,

    /// Settings for the client subcommands
    pub client: Option<EndpointConfig>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(server) = &self.server {
            server.validate("server")?;
        }
        if let Some(client) = &self.client {
            client.validate("client")?;
        }
        Ok(())
    }
}

/// A host/port pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EndpointConfig {
    /// Host name or address
    pub host: Option<String>,

    /// TCP port
    pub port: Option<u16>,
}

impl EndpointConfig {
    fn validate(&self, section: &str) -> Result<(), ConfigError> {
        if let Some(host) = &self.host {
            if host.trim().is_empty() {
                return Err(ConfigError::InvalidValue(format!(
                    "{}.host cannot be empty",
                    section
                )));
            }
        }
        if self.port == Some(0) {
            return Err(ConfigError::InvalidValue(format!(
                "{}.port cannot be 0",
                section
            )));
        }
        Ok(())
    }
}
