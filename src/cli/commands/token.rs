//! token commands - create, drop, write, read against a running server
//!
//! Each handler validates its arguments, connects to the configured
//! endpoint, issues exactly one request and prints the reply. "Not found"
//! and "already exists" are ordinary replies and exit 0; validation and
//! transport failures exit non-zero.

use anyhow::{Context as _, Result};

use crate::cli::args::TokenArgs;
use crate::cli::Context;
use crate::rpc::protocol::{IdOnly, TokenFields};
use crate::rpc::{Command, RemoteService, Request, ServiceError, TokenService};
use crate::ui::output;

/// Which operation to issue.
#[derive(Debug, Clone)]
pub enum TokenOp {
    Create(TokenArgs),
    Drop(String),
    Write(TokenArgs),
    Read(String),
}

impl From<TokenOp> for Request {
    fn from(op: TokenOp) -> Self {
        match op {
            TokenOp::Create(t) => Request::Create(t.into()),
            TokenOp::Drop(id) => Request::Drop(IdOnly { id: Some(id) }),
            TokenOp::Write(t) => Request::Write(t.into()),
            TokenOp::Read(id) => Request::Read(IdOnly { id: Some(id) }),
        }
    }
}

impl From<TokenArgs> for TokenFields {
    fn from(t: TokenArgs) -> Self {
        TokenFields {
            id: Some(t.id),
            name: Some(t.name),
            low: Some(t.low),
            mid: Some(t.mid),
            high: Some(t.high),
        }
    }
}

/// Validate an operation into a command without touching the network.
pub fn prepare(op: TokenOp) -> Result<Command, ServiceError> {
    Ok(Request::from(op).validate()?)
}

/// Run one operation against the server and print the reply.
pub fn run(ctx: &Context, op: TokenOp) -> Result<()> {
    let command = prepare(op)?;

    let config = ctx.load_config()?;
    let addr = ctx.client_addr(&config);
    let verbosity = ctx.verbosity();

    output::debug(
        format!("{} {} via {}", command.op(), command.id(), addr),
        verbosity,
    );

    let runtime = super::runtime()?;
    let reply = runtime
        .block_on(async {
            let service = RemoteService::connect(addr.clone()).await?;
            service.call(command).await
        })
        .with_context(|| format!("Request to {} failed", addr))?;

    output::print_reply(&reply, verbosity);
    Ok(())
}
