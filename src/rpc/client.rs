//! rpc::client
//!
//! TCP client for a running `tokenreg serve` instance.
//!
//! # Design
//!
//! A [`RemoteService`] holds one connection and sends one request at a
//! time over it; concurrent callers queue on an async mutex. There are no
//! retries: a failed call surfaces as a [`ServiceError`] and the caller
//! decides what to do.
//!
//! # Cancellation
//!
//! The connection is taken out of its slot for the duration of an
//! exchange and put back only after the response has been read. A call
//! that fails or is dropped mid-exchange therefore discards the connection,
//! and the next call dials a fresh one instead of reading a stale reply.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::debug;

use super::protocol::{self, Command, Request, Response};
use super::service::{ServiceError, TokenService};
use crate::core::registry::Reply;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Connection {
    async fn open(addr: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let connect_err = |message: String| ServiceError::Connect {
            addr: addr.to_string(),
            message,
        };

        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| connect_err(format!("timed out after {:?}", timeout)))?
            .map_err(|e| connect_err(e.to_string()))?;
        stream.set_nodelay(true).map_err(|e| connect_err(e.to_string()))?;

        debug!(addr, "connected");

        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
        })
    }

    /// One request, one response.
    async fn exchange(&mut self, request: &Request) -> Result<Response, ServiceError> {
        protocol::write_frame(&mut self.writer, request)
            .await
            .map_err(ServiceError::Protocol)?;

        let line = protocol::read_response(&mut self.reader)
            .await
            .map_err(ServiceError::Protocol)?
            .ok_or(ServiceError::Closed)?;

        protocol::decode(&line).map_err(ServiceError::Protocol)
    }
}

/// Remote token service over TCP.
#[derive(Debug)]
pub struct RemoteService {
    addr: String,
    timeout: Duration,
    /// Empty while an exchange is in flight or after one was abandoned.
    conn: Mutex<Option<Connection>>,
}

impl RemoteService {
    /// Connect with the default timeout.
    pub async fn connect(addr: impl Into<String>) -> Result<Self, ServiceError> {
        Self::connect_timeout(addr, DEFAULT_CONNECT_TIMEOUT).await
    }

    /// Connect, giving up after `timeout`.
    ///
    /// The same timeout applies when a discarded connection is redialed.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Connect`] if the address cannot be reached in
    /// time.
    pub async fn connect_timeout(
        addr: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let addr = addr.into();
        let conn = Connection::open(&addr, timeout).await?;
        Ok(Self {
            addr,
            timeout,
            conn: Mutex::new(Some(conn)),
        })
    }

    /// The address this client is connected to.
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl TokenService for RemoteService {
    async fn call(&self, command: Command) -> Result<Reply, ServiceError> {
        let op = command.op();
        let request = Request::from(command);

        let mut slot = self.conn.lock().await;
        let mut conn = match slot.take() {
            Some(conn) => conn,
            None => {
                debug!(addr = %self.addr, "previous exchange incomplete, reconnecting");
                Connection::open(&self.addr, self.timeout).await?
            }
        };

        let response = conn.exchange(&request).await?;
        *slot = Some(conn);
        drop(slot);

        debug!(op, addr = %self.addr, "received response");

        match response {
            Response::Ok(frame) => Reply::try_from(frame).map_err(ServiceError::Protocol),
            Response::Error { error } => Err(ServiceError::Rejected(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_refused_is_connect_error() {
        // Bind then drop to get a port that is very likely closed.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = RemoteService::connect(addr.clone()).await.unwrap_err();
        match err {
            ServiceError::Connect { addr: a, .. } => assert_eq!(a, addr),
            other => panic!("expected connect error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn abandoned_call_discards_connection() {
        use crate::core::registry::Outcome;
        use crate::rpc::protocol::ReplyFrame;
        use tokio::io::AsyncBufReadExt;
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        // First connection swallows its request and never answers; the
        // second answers normally.
        let peer = tokio::spawn(async move {
            let (stalled, _) = listener.accept().await.unwrap();
            let (second, _) = listener.accept().await.unwrap();

            let (read_half, mut write_half) = second.into_split();
            let mut lines = BufReader::new(read_half).lines();
            let line = lines.next_line().await.unwrap().unwrap();
            assert!(line.contains("\"op\":\"drop\""));

            let response = Response::Ok(ReplyFrame {
                outcome: Outcome::NotFound,
                message: "Token with ID t2 not found".into(),
                tokens: Vec::new(),
                final_value: None,
            });
            protocol::write_frame(&mut write_half, &response).await.unwrap();
            drop(stalled);
        });

        let client = RemoteService::connect(addr).await.unwrap();
        let abandoned =
            tokio::time::timeout(Duration::from_millis(50), client.read("slow")).await;
        assert!(abandoned.is_err());

        let reply = client.drop("t2").await.unwrap();
        assert_eq!(reply.outcome, Outcome::NotFound);
        assert_eq!(reply.message, "Token with ID t2 not found");

        peer.await.unwrap();
    }
}
