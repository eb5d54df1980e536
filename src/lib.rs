//! tokenreg - An in-memory token registry served over TCP
//!
//! A token pairs an ID with a name and a three-point domain `[low, mid, high]`.
//! Writing a token computes its partial value: the nonce in `[low, mid)` whose
//! SHA-256 hash of `"<name> <nonce>"` is smallest. Reading it computes the
//! final value over `[mid, high)` the same way.
//!
//! # Architecture
//!
//! - [`core`] - Domain types, the hash ranker, the registry, configuration
//! - [`rpc`] - Wire protocol, TCP server, and client
//! - [`cli`] - Command-line interface layer (parses args, delegates to rpc)
//! - [`ui`] - Console output
//! - [`logging`] - Diagnostic logging setup
//!
//! # Invariants
//!
//! 1. A token's partial value is always consistent with its current name and domain
//! 2. A write resets the final value until the next read
//! 3. Every registry operation is atomic with respect to every other

pub mod cli;
pub mod core;
pub mod logging;
pub mod rpc;
pub mod ui;
