//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag. Token
//! lists use one line per token:
//!
//! ```text
//! Tokens:
//! - ID: t1, Name: alice, Partial Value: 2, Final Value: 4
//! ```

use std::fmt::Display;

use crate::core::registry::{Reply, Token};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Format a single token.
pub fn format_token(token: &Token) -> String {
    format!(
        "ID: {}, Name: {}, Partial Value: {}, Final Value: {}",
        token.id, token.name, token.partial_value, token.final_value
    )
}

/// Format a single token with its domain and state.
pub fn format_token_long(token: &Token) -> String {
    format!(
        "{}, Domain: {}, State: {}",
        format_token(token),
        token.domain,
        token.state
    )
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a token list under a `Tokens:` header.
pub fn format_tokens(tokens: &[Token], long: bool) -> String {
    let lines: Vec<String> = tokens
        .iter()
        .map(|t| {
            if long {
                format_token_long(t)
            } else {
                format_token(t)
            }
        })
        .collect();

    if lines.is_empty() {
        "Tokens: (none)".to_string()
    } else {
        format!("Tokens:\n{}", format_list(&lines, "- "))
    }
}

/// Print a registry reply: message, optional final value, then the tokens.
///
/// In quiet mode only the final value (if any) is printed, so scripts can
/// capture it.
pub fn print_reply(reply: &Reply, verbosity: Verbosity) {
    if verbosity == Verbosity::Quiet {
        if let Some(value) = reply.final_value {
            println!("{}", value);
        }
        return;
    }

    println!("{}", reply.message);
    if let Some(value) = reply.final_value {
        println!("Final value: {}", value);
    }
    println!(
        "{}",
        format_tokens(&reply.tokens, verbosity == Verbosity::Debug)
    );
}
