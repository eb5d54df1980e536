//! rpc::server
//!
//! TCP front end for a [`TokenRegistry`].
//!
//! # Architecture
//!
//! One task accepts connections; each connection gets its own task that
//! reads request frames, validates them, runs exactly one registry
//! operation on the blocking pool, and writes one response frame.
//!
//! Validation failures, malformed JSON and non-UTF-8 lines are answered
//! with an error frame and the connection stays open. An oversized frame
//! or an I/O error closes the connection.
//!
//! # Shutdown
//!
//! When the shutdown future resolves the listener stops accepting, every
//! connection finishes the request it is handling and closes, and
//! [`Server::serve`] returns once all connection tasks are done.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::protocol::{self, ProtocolError, ReplyFrame, Request, Response};
use super::service;
use crate::core::registry::TokenRegistry;

/// A bound, not yet serving, token server.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    registry: Arc<TokenRegistry>,
}

impl Server {
    /// Bind a listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be resolved or bound.
    pub async fn bind(
        addr: impl ToSocketAddrs,
        registry: Arc<TokenRegistry>,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, registry })
    }

    /// The bound address (useful after binding port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept and serve connections until `shutdown` resolves.
    ///
    /// Accept errors are logged and do not stop the server.
    pub async fn serve<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        info!(%addr, "token server listening");

        let (stop_tx, stop_rx) = watch::channel(false);
        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested, no longer accepting connections");
                    break;
                }
                res = self.listener.accept() => {
                    match res {
                        Ok((stream, peer)) => {
                            connections.spawn(handle_connection(
                                stream,
                                peer,
                                Arc::clone(&self.registry),
                                stop_rx.clone(),
                            ));
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                        }
                    }
                }
                // Reap finished connections so the set does not grow unbounded.
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        let _ = stop_tx.send(true);
        let open = connections.len();
        if open > 0 {
            info!(open, "waiting for open connections to finish");
        }
        while connections.join_next().await.is_some() {}

        info!("token server stopped");
        Ok(())
    }
}

/// Serve one client until EOF, error, or shutdown.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    registry: Arc<TokenRegistry>,
    mut stop: watch::Receiver<bool>,
) {
    debug!(%peer, "connection opened");

    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    loop {
        let line = tokio::select! {
            res = protocol::read_request(&mut reader) => res,
            _ = stop.changed() => break,
        };

        let response = match line {
            Ok(Some(line)) => handle_frame(&line, &registry).await,
            Ok(None) => break,
            Err(e @ ProtocolError::FrameTooLarge { .. }) => {
                warn!(%peer, "oversized frame, closing connection");
                let _ = protocol::write_frame(&mut writer, &Response::error(e)).await;
                break;
            }
            Err(e) if e.is_validation() => {
                debug!(%peer, error = %e, "rejected frame");
                Response::error(e)
            }
            Err(e) => {
                warn!(%peer, error = %e, "read failed, closing connection");
                break;
            }
        };

        if let Err(e) = protocol::write_frame(&mut writer, &response).await {
            warn!(%peer, error = %e, "write failed, closing connection");
            break;
        }
    }

    debug!(%peer, "connection closed");
}

/// Decode, validate and execute a single request frame.
async fn handle_frame(line: &str, registry: &Arc<TokenRegistry>) -> Response {
    let command = match protocol::decode::<Request>(line).and_then(Request::validate) {
        Ok(command) => command,
        Err(e) => {
            debug!(error = %e, "rejected request");
            return Response::error(e);
        }
    };

    let op = command.op();
    let id = command.id().clone();
    let registry = Arc::clone(registry);

    match tokio::task::spawn_blocking(move || service::execute(&registry, command)).await {
        Ok(reply) => {
            info!(
                op,
                id = %id,
                outcome = ?reply.outcome,
                tokens = reply.tokens.len(),
                "handled request"
            );
            Response::Ok(ReplyFrame::from(&reply))
        }
        Err(e) => {
            error!(op, id = %id, error = %e, "registry task failed");
            Response::error(format!("internal error: {}", e))
        }
    }
}
