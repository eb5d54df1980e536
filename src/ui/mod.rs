//! ui
//!
//! User-facing console output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All console output from the client subcommands goes through this module
//! so that `--quiet` and `--debug` are honored uniformly. Diagnostic logs
//! are separate and go through `tracing` (see [`crate::logging`]).

pub mod output;
