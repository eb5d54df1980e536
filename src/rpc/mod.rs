//! rpc
//!
//! Request/response access to the token registry.
//!
//! # Modules
//!
//! - [`protocol`] - Newline-delimited JSON frames and request validation
//! - [`service`] - The `TokenService` trait and its in-process implementation
//! - [`server`] - TCP server dispatching frames to the registry
//! - [`client`] - TCP client implementing `TokenService`
//!
//! # Design
//!
//! The registry never sees an unvalidated request. Every frame is turned
//! into a [`protocol::Command`] first; missing fields and inverted domains
//! are answered with an error frame and the registry is left untouched.

pub mod client;
pub mod protocol;
pub mod server;
pub mod service;

pub use client::RemoteService;
pub use protocol::{Command, ProtocolError, Request, Response};
pub use server::Server;
pub use service::{LocalService, ServiceError, TokenService};
