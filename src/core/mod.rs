//! core
//!
//! Core domain types and the token registry.
//!
//! # Modules
//!
//! - [`types`] - Strong types: TokenId, TokenName, Domain
//! - [`ranker`] - SHA-256 hash minimization over a nonce range
//! - [`registry`] - The mutex-guarded token store
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - All registry mutation is serialized through one lock
//! - All derived values are deterministic

pub mod config;
pub mod ranker;
pub mod registry;
pub mod types;
