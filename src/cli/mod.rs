//! cli
//!
//! Command-line interface layer for tokenreg.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Resolve configuration with CLI flags taking precedence
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. `serve` hands a fresh registry to
//! [`crate::rpc::Server`]; the client commands go through
//! [`crate::rpc::TokenService`] and render the reply via [`crate::ui`].

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::ui::output::Verbosity;

/// Execution context derived from global flags.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Explicit config file
    pub config_path: Option<PathBuf>,
    /// Host override
    pub host: Option<String>,
    /// Port override
    pub port: Option<u16>,
    /// Debug output
    pub debug: bool,
    /// Minimal output
    pub quiet: bool,
}

impl Context {
    /// Output verbosity for these flags.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }

    /// Load configuration honoring `--config`.
    pub fn load_config(&self) -> Result<Config> {
        Config::load(self.config_path.as_deref()).context("Failed to load configuration")
    }

    /// Address for `serve`: flags over `[server]` over defaults.
    pub fn server_addr(&self, config: &Config) -> String {
        let host = self.host.as_deref().unwrap_or(config.server_host());
        let port = self.port.unwrap_or(config.server_port());
        format!("{}:{}", host, port)
    }

    /// Address for client commands: flags over `[client]` over defaults.
    pub fn client_addr(&self, config: &Config) -> String {
        let host = self.host.as_deref().unwrap_or(config.client_host());
        let port = self.port.unwrap_or(config.client_port());
        format!("{}:{}", host, port)
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    crate::logging::init(cli.debug, cli.quiet);

    let ctx = Context {
        config_path: cli.config.clone(),
        host: cli.host.clone(),
        port: cli.port,
        debug: cli.debug,
        quiet: cli.quiet,
    };

    commands::dispatch(cli.command, &ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ConfigFile, EndpointConfig};

    fn config_with_client(host: &str, port: u16) -> Config {
        Config::from_file(ConfigFile {
            client: Some(EndpointConfig {
                host: Some(host.to_string()),
                port: Some(port),
            }),
            ..Default::default()
        })
    }

    #[test]
    fn flags_override_config() {
        let config = config_with_client("registry.internal", 7000);
        let ctx = Context {
            port: Some(7100),
            ..Default::default()
        };
        assert_eq!(ctx.client_addr(&config), "registry.internal:7100");
    }

    #[test]
    fn config_used_without_flags() {
        let config = config_with_client("registry.internal", 7000);
        let ctx = Context::default();
        assert_eq!(ctx.client_addr(&config), "registry.internal:7000");
        assert_eq!(ctx.server_addr(&config), "0.0.0.0:50051");
    }

    #[test]
    fn verbosity_follows_flags() {
        let ctx = Context {
            quiet: true,
            ..Default::default()
        };
        assert_eq!(ctx.verbosity(), Verbosity::Quiet);
    }
}
