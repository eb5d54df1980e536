//! rpc::service
//!
//! The `TokenService` seam between callers and a registry.
//!
//! # Design
//!
//! The trait is async because the remote implementation does network I/O.
//! Two implementations exist:
//!
//! - [`LocalService`] - in-process, wraps an `Arc<TokenRegistry>`
//! - [`crate::rpc::client::RemoteService`] - talks to a `tokenreg serve`
//!   instance over TCP
//!
//! Both return the same [`Reply`], so callers cannot tell them apart.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tokenreg::core::registry::{Outcome, TokenRegistry};
//! use tokenreg::rpc::service::{LocalService, TokenService};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let service = LocalService::new(Arc::new(TokenRegistry::new()));
//! let reply = service.create("t1", "alice", 0, 3, 6).await.unwrap();
//! assert_eq!(reply.outcome, Outcome::Created);
//! # });
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::protocol::{Command, IdOnly, ProtocolError, Request, TokenFields};
use crate::core::registry::{Reply, TokenRegistry};

/// Errors from service calls.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was rejected before reaching the registry.
    #[error("invalid request: {0}")]
    Invalid(#[source] ProtocolError),

    /// The server answered with an error frame.
    #[error("server rejected request: {0}")]
    Rejected(String),

    /// Could not reach the server.
    #[error("failed to connect to {addr}: {message}")]
    Connect { addr: String, message: String },

    /// The server closed the connection mid-call.
    #[error("connection closed by server")]
    Closed,

    /// Framing or transport failure after connecting.
    #[error("protocol error: {0}")]
    Protocol(#[source] ProtocolError),

    /// The blocking registry task failed.
    #[error("registry task failed: {0}")]
    Task(String),
}

impl ServiceError {
    /// Whether the caller supplied bad input.
    pub fn is_validation(&self) -> bool {
        matches!(self, ServiceError::Invalid(_) | ServiceError::Rejected(_))
    }

    /// Whether the failure might succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ServiceError::Connect { .. } | ServiceError::Closed | ServiceError::Protocol(_)
        )
    }
}

impl From<ProtocolError> for ServiceError {
    fn from(err: ProtocolError) -> Self {
        if err.is_validation() {
            ServiceError::Invalid(err)
        } else {
            ServiceError::Protocol(err)
        }
    }
}

/// Operations on a token registry.
///
/// Implementors provide [`TokenService::call`]; the per-operation methods
/// validate raw arguments and forward to it.
#[async_trait]
pub trait TokenService: Send + Sync {
    /// Execute a validated command.
    async fn call(&self, command: Command) -> Result<Reply, ServiceError>;

    /// Create a token.
    async fn create(
        &self,
        id: &str,
        name: &str,
        low: u64,
        mid: u64,
        high: u64,
    ) -> Result<Reply, ServiceError> {
        let command = Request::Create(token_fields(id, name, low, mid, high)).validate()?;
        self.call(command).await
    }

    /// Drop a token.
    async fn drop(&self, id: &str) -> Result<Reply, ServiceError> {
        let command = Request::Drop(id_only(id)).validate()?;
        self.call(command).await
    }

    /// Replace a token's name and domain.
    async fn write(
        &self,
        id: &str,
        name: &str,
        low: u64,
        mid: u64,
        high: u64,
    ) -> Result<Reply, ServiceError> {
        let command = Request::Write(token_fields(id, name, low, mid, high)).validate()?;
        self.call(command).await
    }

    /// Compute a token's final value.
    async fn read(&self, id: &str) -> Result<Reply, ServiceError> {
        let command = Request::Read(id_only(id)).validate()?;
        self.call(command).await
    }
}

fn token_fields(id: &str, name: &str, low: u64, mid: u64, high: u64) -> TokenFields {
    TokenFields {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        low: Some(low),
        mid: Some(mid),
        high: Some(high),
    }
}

fn id_only(id: &str) -> IdOnly {
    IdOnly {
        id: Some(id.to_string()),
    }
}

/// Run a command against a registry. Blocks for the duration of any scan.
pub fn execute(registry: &TokenRegistry, command: Command) -> Reply {
    match command {
        Command::Create { id, name, domain } => registry.create(id, name, domain),
        Command::Drop { id } => registry.drop(&id),
        Command::Write { id, name, domain } => registry.write(&id, name, domain),
        Command::Read { id } => registry.read(&id),
    }
}

/// In-process service.
///
/// Registry calls run on tokio's blocking pool so a long scan does not
/// stall the async workers.
#[derive(Debug, Clone)]
pub struct LocalService {
    registry: Arc<TokenRegistry>,
}

impl LocalService {
    pub fn new(registry: Arc<TokenRegistry>) -> Self {
        Self { registry }
    }

    /// The wrapped registry.
    pub fn registry(&self) -> &Arc<TokenRegistry> {
        &self.registry
    }
}

#[async_trait]
impl TokenService for LocalService {
    async fn call(&self, command: Command) -> Result<Reply, ServiceError> {
        let registry = Arc::clone(&self.registry);
        tokio::task::spawn_blocking(move || execute(&registry, command))
            .await
            .map_err(|e| ServiceError::Task(e.to_string()))
    }
}
