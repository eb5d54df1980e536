//! rpc::protocol
//!
//! Wire format for the token service.
//!
//! # Framing
//!
//! One JSON object per line (`\n`-terminated), in both directions. A request
//! may not exceed [`MAX_FRAME_LEN`] bytes; an oversized request poisons the
//! stream and the connection is closed after an error response. Responses
//! carry a full registry snapshot and are bounded by the much larger
//! [`MAX_RESPONSE_LEN`].
//!
//! A line that is not UTF-8 is a malformed frame like bad JSON: it is
//! consumed whole and answered, and the stream stays usable.
//!
//! # Requests
//!
//! ```json
//! {"op":"create","id":"t1","name":"alice","low":0,"mid":3,"high":6}
//! {"op":"drop","id":"t1"}
//! {"op":"write","id":"t1","name":"alice","low":0,"mid":3,"high":6}
//! {"op":"read","id":"t1"}
//! ```
//!
//! Every field is optional on the wire; [`Request::validate`] turns a frame
//! into a [`Command`] or reports the first missing or invalid field.
//!
//! # Responses
//!
//! ```json
//! {"status":"ok","outcome":"created","message":"...","tokens":[...]}
//! {"status":"error","error":"missing required field 'name'"}
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::core::registry::{Outcome, Reply, Token, TokenState};
use crate::core::types::{Domain, TokenId, TokenName, TypeError};

/// Upper bound on a request frame, newline included.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Upper bound on a response frame, newline included.
pub const MAX_RESPONSE_LEN: usize = 1024 * 1024 * 1024;

/// Errors from encoding, decoding or validating frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("frame exceeds the {limit}-byte limit")]
    FrameTooLarge { limit: usize },

    #[error("malformed frame: not valid UTF-8")]
    InvalidUtf8,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error(transparent)]
    Invalid(#[from] TypeError),
}

impl ProtocolError {
    /// Whether the error is the caller's fault and leaves the stream usable.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ProtocolError::Malformed(_)
                | ProtocolError::InvalidUtf8
                | ProtocolError::MissingField(_)
                | ProtocolError::Invalid(_)
        )
    }
}

/// Optional-everything body of create and write requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mid: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<u64>,
}

/// Body of drop and read requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdOnly {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// A request frame as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Create(TokenFields),
    Drop(IdOnly),
    Write(TokenFields),
    Read(IdOnly),
}

/// A validated request, ready for the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create {
        id: TokenId,
        name: TokenName,
        domain: Domain,
    },
    Drop {
        id: TokenId,
    },
    Write {
        id: TokenId,
        name: TokenName,
        domain: Domain,
    },
    Read {
        id: TokenId,
    },
}

impl Command {
    /// Operation name, for logs.
    pub fn op(&self) -> &'static str {
        match self {
            Command::Create { .. } => "create",
            Command::Drop { .. } => "drop",
            Command::Write { .. } => "write",
            Command::Read { .. } => "read",
        }
    }

    /// Target token id.
    pub fn id(&self) -> &TokenId {
        match self {
            Command::Create { id, .. }
            | Command::Drop { id }
            | Command::Write { id, .. }
            | Command::Read { id } => id,
        }
    }
}

impl From<Command> for Request {
    fn from(cmd: Command) -> Self {
        match cmd {
            Command::Create { id, name, domain } => Request::Create(fields(id, name, domain)),
            Command::Drop { id } => Request::Drop(IdOnly {
                id: Some(id.into()),
            }),
            Command::Write { id, name, domain } => Request::Write(fields(id, name, domain)),
            Command::Read { id } => Request::Read(IdOnly {
                id: Some(id.into()),
            }),
        }
    }
}

fn fields(id: TokenId, name: TokenName, domain: Domain) -> TokenFields {
    TokenFields {
        id: Some(id.into()),
        name: Some(name.into()),
        low: Some(domain.low()),
        mid: Some(domain.mid()),
        high: Some(domain.high()),
    }
}

impl Request {
    /// Check required fields and build a [`Command`].
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::MissingField`] for the first absent field
    /// - [`ProtocolError::Invalid`] for an empty id/name or inverted domain
    pub fn validate(self) -> Result<Command, ProtocolError> {
        match self {
            Request::Create(f) => {
                let (id, name, domain) = f.validate()?;
                Ok(Command::Create { id, name, domain })
            }
            Request::Write(f) => {
                let (id, name, domain) = f.validate()?;
                Ok(Command::Write { id, name, domain })
            }
            Request::Drop(f) => Ok(Command::Drop { id: f.validate()? }),
            Request::Read(f) => Ok(Command::Read { id: f.validate()? }),
        }
    }
}

impl TokenFields {
    fn validate(self) -> Result<(TokenId, TokenName, Domain), ProtocolError> {
        let id = self.id.ok_or(ProtocolError::MissingField("id"))?;
        let name = self.name.ok_or(ProtocolError::MissingField("name"))?;
        let low = self.low.ok_or(ProtocolError::MissingField("low"))?;
        let mid = self.mid.ok_or(ProtocolError::MissingField("mid"))?;
        let high = self.high.ok_or(ProtocolError::MissingField("high"))?;

        Ok((
            TokenId::new(id)?,
            TokenName::new(name)?,
            Domain::new(low, mid, high)?,
        ))
    }
}

impl IdOnly {
    fn validate(self) -> Result<TokenId, ProtocolError> {
        let id = self.id.ok_or(ProtocolError::MissingField("id"))?;
        Ok(TokenId::new(id)?)
    }
}

/// A token as rendered on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenFrame {
    pub id: String,
    pub name: String,
    pub low: u64,
    pub mid: u64,
    pub high: u64,
    pub partial_value: u64,
    pub final_value: u64,
    pub state: TokenState,
}

impl From<&Token> for TokenFrame {
    fn from(t: &Token) -> Self {
        Self {
            id: t.id.to_string(),
            name: t.name.to_string(),
            low: t.domain.low(),
            mid: t.domain.mid(),
            high: t.domain.high(),
            partial_value: t.partial_value,
            final_value: t.final_value,
            state: t.state,
        }
    }
}

impl TryFrom<TokenFrame> for Token {
    type Error = ProtocolError;

    fn try_from(f: TokenFrame) -> Result<Self, Self::Error> {
        Ok(Token {
            id: TokenId::new(f.id)?,
            name: TokenName::new(f.name)?,
            domain: Domain::new(f.low, f.mid, f.high)?,
            partial_value: f.partial_value,
            final_value: f.final_value,
            state: f.state,
        })
    }
}

/// Successful response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyFrame {
    pub outcome: Outcome,
    pub message: String,
    pub tokens: Vec<TokenFrame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_value: Option<u64>,
}

impl From<&Reply> for ReplyFrame {
    fn from(r: &Reply) -> Self {
        Self {
            outcome: r.outcome,
            message: r.message.clone(),
            tokens: r.tokens.iter().map(TokenFrame::from).collect(),
            final_value: r.final_value,
        }
    }
}

impl TryFrom<ReplyFrame> for Reply {
    type Error = ProtocolError;

    fn try_from(f: ReplyFrame) -> Result<Self, Self::Error> {
        let tokens = f
            .tokens
            .into_iter()
            .map(Token::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Reply {
            outcome: f.outcome,
            message: f.message,
            tokens,
            final_value: f.final_value,
        })
    }
}

/// A response frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Ok(ReplyFrame),
    Error { error: String },
}

impl Response {
    pub fn error(message: impl std::fmt::Display) -> Self {
        Response::Error {
            error: message.to_string(),
        }
    }
}

/// Serialize a frame, newline included.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    let mut buf = serde_json::to_vec(value)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Deserialize a single frame (with or without its trailing newline).
pub fn decode<T: DeserializeOwned>(line: &str) -> Result<T, ProtocolError> {
    Ok(serde_json::from_str(line.trim_end())?)
}

/// Read one request frame, bounded by [`MAX_FRAME_LEN`].
///
/// Returns `Ok(None)` on a clean EOF between frames. Blank lines are
/// skipped.
pub async fn read_request<R>(reader: &mut R) -> Result<Option<String>, ProtocolError>
where
    R: AsyncBufRead + Unpin,
{
    read_line(reader, MAX_FRAME_LEN).await
}

/// Read one response frame, bounded by [`MAX_RESPONSE_LEN`].
pub async fn read_response<R>(reader: &mut R) -> Result<Option<String>, ProtocolError>
where
    R: AsyncBufRead + Unpin,
{
    read_line(reader, MAX_RESPONSE_LEN).await
}

/// Read one line of at most `limit` bytes.
///
/// A line that is not UTF-8 is consumed in full before
/// [`ProtocolError::InvalidUtf8`] is returned, so the next read starts at
/// the next frame.
pub async fn read_line<R>(reader: &mut R, limit: usize) -> Result<Option<String>, ProtocolError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let mut buf = Vec::new();
        let n = (&mut *reader)
            .take(limit as u64 + 1)
            .read_until(b'\n', &mut buf)
            .await?;

        if n == 0 {
            return Ok(None);
        }
        if n > limit {
            return Err(ProtocolError::FrameTooLarge { limit });
        }
        let line = String::from_utf8(buf).map_err(|_| ProtocolError::InvalidUtf8)?;
        if line.trim().is_empty() {
            continue;
        }
        return Ok(Some(line));
    }
}

/// Write one frame and flush.
pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let buf = encode(value)?;
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}
