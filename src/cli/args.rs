//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this config file instead of searching
//! - `--host <host>` / `--port <port>`: Override the configured endpoint
//! - `--debug`: Enable debug logging and long token listings
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tokenreg - In-memory token registry server and client
#[derive(Parser, Debug)]
#[command(name = "tokenreg")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use this config file instead of the standard locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Host to bind (serve) or connect to (client commands)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port to bind (serve) or connect to (client commands)
    #[arg(long, global = true, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; client commands print only the final value
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the token registry server
    #[command(
        name = "serve",
        long_about = "Run the token registry server.\n\n\
            The server keeps every token in memory and answers create, drop, write \
            and read requests over TCP. All registry operations are serialized: a \
            write or read with a wide range blocks other requests until its hash \
            scan completes. State is lost when the server exits.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Serve on the configured address (default 0.0.0.0:50051)
    tokenreg serve

    # Serve on a specific port with debug logging
    tokenreg serve --port 6000 --debug

STOPPING:
    Ctrl-C or SIGTERM stops accepting connections, lets in-flight
    requests finish, then exits."
    )]
    Serve,

    /// Create a new token
    #[command(
        name = "create",
        long_about = "Create a new token with zeroed partial and final values.\n\n\
            If a token with the same ID already exists it is left unchanged and \
            the server reports that it already exists.",
        after_help = "\
WORKFLOW EXAMPLES:
    tokenreg create --id t1 --name alice --low 0 --mid 3 --high 6"
    )]
    Create {
        #[command(flatten)]
        token: TokenArgs,
    },

    /// Drop an existing token
    #[command(name = "drop")]
    Drop {
        /// Token ID
        #[arg(long)]
        id: String,
    },

    /// Write name and domain to a token and compute its partial value
    #[command(
        name = "write",
        long_about = "Replace a token's name and domain.\n\n\
            The partial value is recomputed as the nonce in [low, mid) whose \
            SHA-256 hash of \"<name> <nonce>\" is smallest. The final value is \
            reset to 0 until the next read.",
        after_help = "\
WORKFLOW EXAMPLES:
    tokenreg write --id t1 --name alice --low 0 --mid 5 --high 10
    tokenreg read --id t1"
    )]
    Write {
        #[command(flatten)]
        token: TokenArgs,
    },

    /// Compute and show the final value of a token
    #[command(
        name = "read",
        long_about = "Compute a token's final value.\n\n\
            The final value is the nonce in [mid, high) whose hash is smallest. \
            Reading a token that was never written leaves its final value at 0.",
        after_help = "\
SCRIPTING:
    # Print only the final value
    tokenreg -q read --id t1"
    )]
    Read {
        /// Token ID
        #[arg(long)]
        id: String,
    },

    /// Show or initialize configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
INSTALLATION:
    # Bash
    tokenreg completion bash > ~/.local/share/bash-completion/completions/tokenreg

    # Zsh
    tokenreg completion zsh > ~/.zfunc/_tokenreg

    # Fish
    tokenreg completion fish > ~/.config/fish/completions/tokenreg.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Fields of a create or write request.
#[derive(clap::Args, Debug, Clone)]
pub struct TokenArgs {
    /// Token ID
    #[arg(long)]
    pub id: String,

    /// Token name (seed of the hash search)
    #[arg(long)]
    pub name: String,

    /// Low bound (inclusive) of the partial range
    #[arg(long)]
    pub low: u64,

    /// Split point: end of the partial range, start of the final range
    #[arg(long)]
    pub mid: u64,

    /// High bound (exclusive) of the final range
    #[arg(long)]
    pub high: u64,
}

/// Config subcommand actions.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a config file holding the defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
