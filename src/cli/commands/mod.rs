//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves configuration and flags
//! 2. Calls the server (or runs it)
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! `serve` and the token commands involve network I/O. Dispatch stays
//! synchronous; those handlers build a tokio runtime and block on it.

mod completion;
mod config_cmd;
mod serve;
mod token;

pub use completion::completion;
pub use config_cmd::{init as config_init, show as config_show};
pub use serve::serve;
pub use token::{prepare, TokenOp};

use crate::cli::args::{Command, ConfigAction};
use crate::cli::Context;
use anyhow::{Context as _, Result};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Serve => serve::serve(ctx),
        Command::Create { token } => token::run(ctx, TokenOp::Create(token)),
        Command::Drop { id } => token::run(ctx, TokenOp::Drop(id)),
        Command::Write { token } => token::run(ctx, TokenOp::Write(token)),
        Command::Read { id } => token::run(ctx, TokenOp::Read(id)),
        Command::Config { action } => match action {
            ConfigAction::Show => config_cmd::show(ctx),
            ConfigAction::Init { force } => config_cmd::init(ctx, force),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Multi-threaded runtime for async handlers.
fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}
