//! core::registry
//!
//! The in-memory token registry.
//!
//! # Architecture
//!
//! The registry owns every [`Token`] in a single `BTreeMap` behind a single
//! `Mutex`. All four operations take the lock for their full duration,
//! including the hash scan in [`TokenRegistry::write`] and
//! [`TokenRegistry::read`]. A long scan therefore blocks every other
//! registry operation until it finishes.
//!
//! # Invariants
//!
//! - Token ids are unique among live tokens
//! - `partial_value` is recomputed by every write; `final_value` is reset by
//!   every write and recomputed by every read of a written token
//! - No operation is partially applied: derived values are computed before
//!   any field is assigned
//! - Callers only ever see snapshots (owned clones), ordered by id
//!
//! # Stored values
//!
//! Both derived values are the winning **nonce** of the scan, not the hash.
//! `final_value` is not clamped against `partial_value`. Reading a token
//! that was never written is a zero-range no-op ([`Outcome::NotWritten`]).
//!
//! # Example
//!
//! ```
//! use tokenreg::core::registry::{Outcome, TokenRegistry};
//! use tokenreg::core::types::{Domain, TokenId, TokenName};
//!
//! let registry = TokenRegistry::new();
//! let id = TokenId::new("t1").unwrap();
//! let name = TokenName::new("alice").unwrap();
//! let domain = Domain::new(0, 3, 6).unwrap();
//!
//! let reply = registry.create(id.clone(), name.clone(), domain);
//! assert_eq!(reply.outcome, Outcome::Created);
//!
//! registry.write(&id, name, domain);
//! let reply = registry.read(&id);
//! assert_eq!(reply.outcome, Outcome::Finalized);
//! assert!((3..6).contains(&reply.final_value.unwrap()));
//! ```

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ranker::{self, Ranked};
use super::types::{Domain, TokenId, TokenName};

/// Lifecycle position of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
    /// Created, never written. Derived values are 0 and meaningless.
    Created,
    /// Written; `partial_value` is current, `final_value` is 0.
    Written,
    /// Read after a write; both derived values are current.
    Finalized,
}

impl std::fmt::Display for TokenState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TokenState::Created => "created",
            TokenState::Written => "written",
            TokenState::Finalized => "finalized",
        };
        write!(f, "{}", s)
    }
}

/// A token record.
///
/// Instances handed out by the registry are snapshots; mutating one has no
/// effect on the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub id: TokenId,
    pub name: TokenName,
    pub domain: Domain,
    pub partial_value: u64,
    pub final_value: u64,
    pub state: TokenState,
}

impl Token {
    fn new(id: TokenId, name: TokenName, domain: Domain) -> Self {
        Self {
            id,
            name,
            domain,
            partial_value: 0,
            final_value: 0,
            state: TokenState::Created,
        }
    }
}

/// What an operation did.
///
/// Not-found, already-exists and not-written are ordinary outcomes, not
/// errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Created,
    AlreadyExists,
    Dropped,
    Written,
    Finalized,
    NotWritten,
    NotFound,
}

impl Outcome {
    /// Whether the operation changed registry state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Outcome::Created | Outcome::Dropped | Outcome::Written | Outcome::Finalized
        )
    }

    /// Human-readable message for this outcome.
    pub fn message(&self, id: &TokenId) -> String {
        match self {
            Outcome::Created => format!("Token with ID {} created successfully", id),
            Outcome::AlreadyExists => format!("Token with ID {} already exists", id),
            Outcome::Dropped => format!("Token with ID {} dropped successfully", id),
            Outcome::Written => format!("Properties updated for token with ID {}", id),
            Outcome::Finalized => format!("Final value read for token with ID {}", id),
            Outcome::NotWritten => format!(
                "Token with ID {} has not been written; final value left at 0",
                id
            ),
            Outcome::NotFound => format!("Token with ID {} not found", id),
        }
    }
}

/// Result of a registry operation: outcome, message and full snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub outcome: Outcome,
    pub message: String,
    /// Every live token, ordered by id.
    pub tokens: Vec<Token>,
    /// Set only by [`TokenRegistry::read`] on an existing token.
    pub final_value: Option<u64>,
}

/// Concurrency-safe token store.
///
/// Share it between threads with `Arc<TokenRegistry>`.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    tokens: Mutex<BTreeMap<TokenId, Token>>,
}

impl TokenRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new token with zeroed derived values.
    ///
    /// An existing id is left untouched and reported as
    /// [`Outcome::AlreadyExists`].
    pub fn create(&self, id: TokenId, name: TokenName, domain: Domain) -> Reply {
        let mut tokens = self.lock();

        let outcome = if tokens.contains_key(&id) {
            Outcome::AlreadyExists
        } else {
            tokens.insert(id.clone(), Token::new(id.clone(), name, domain));
            Outcome::Created
        };

        debug!(id = %id, ?outcome, "create");
        Self::reply(&tokens, &id, outcome, None)
    }

    /// Remove a token.
    pub fn drop(&self, id: &TokenId) -> Reply {
        let mut tokens = self.lock();

        let outcome = match tokens.remove(id) {
            Some(_) => Outcome::Dropped,
            None => Outcome::NotFound,
        };

        debug!(id = %id, ?outcome, "drop");
        Self::reply(&tokens, id, outcome, None)
    }

    /// Replace name and domain, recompute the partial value, reset the
    /// final value.
    ///
    /// The scan over `[low, mid)` runs while the lock is held.
    pub fn write(&self, id: &TokenId, name: TokenName, domain: Domain) -> Reply {
        let mut tokens = self.lock();

        let Some(token) = tokens.get_mut(id) else {
            debug!(id = %id, "write: not found");
            return Self::reply(&tokens, id, Outcome::NotFound, None);
        };

        let (lo, hi) = domain.partial_range();
        let ranked = timed_scan(name.as_str(), lo, hi);
        log_scan(id, "partial", lo, hi, ranked.as_ref());

        token.name = name;
        token.domain = domain;
        token.partial_value = ranked.map_or(0, |r| r.nonce);
        token.final_value = 0;
        token.state = TokenState::Written;

        Self::reply(&tokens, id, Outcome::Written, None)
    }

    /// Compute and store the final value over `[mid, high)`.
    ///
    /// A token that was never written is not scanned: its final value stays
    /// 0 and the outcome is [`Outcome::NotWritten`].
    pub fn read(&self, id: &TokenId) -> Reply {
        let mut tokens = self.lock();

        let Some(token) = tokens.get_mut(id) else {
            debug!(id = %id, "read: not found");
            return Self::reply(&tokens, id, Outcome::NotFound, None);
        };

        if token.state == TokenState::Created {
            debug!(id = %id, "read: token never written, skipping scan");
            return Self::reply(&tokens, id, Outcome::NotWritten, Some(0));
        }

        let (lo, hi) = token.domain.final_range();
        let ranked = timed_scan(token.name.as_str(), lo, hi);
        log_scan(id, "final", lo, hi, ranked.as_ref());

        let final_value = ranked.map_or(0, |r| r.nonce);
        token.final_value = final_value;
        token.state = TokenState::Finalized;

        Self::reply(&tokens, id, Outcome::Finalized, Some(final_value))
    }

    /// Snapshot of every live token, ordered by id.
    pub fn snapshot(&self) -> Vec<Token> {
        self.lock().values().cloned().collect()
    }

    /// Number of live tokens.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the registry holds no tokens.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Operations never leave a half-written token behind, so the map is
    // still consistent after a panic in another holder.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<TokenId, Token>> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reply(
        tokens: &BTreeMap<TokenId, Token>,
        id: &TokenId,
        outcome: Outcome,
        final_value: Option<u64>,
    ) -> Reply {
        Reply {
            outcome,
            message: outcome.message(id),
            tokens: tokens.values().cloned().collect(),
            final_value,
        }
    }
}

fn timed_scan(name: &str, lo: u64, hi: u64) -> Option<Ranked> {
    let started = Instant::now();
    let ranked = ranker::scan(name, lo, hi);
    debug!(
        width = hi - lo,
        elapsed_us = started.elapsed().as_micros() as u64,
        "scan complete"
    );
    ranked
}

fn log_scan(id: &TokenId, which: &str, lo: u64, hi: u64, ranked: Option<&Ranked>) {
    match ranked {
        Some(r) => debug!(
            id = %id,
            which,
            lo,
            hi,
            nonce = r.nonce,
            hash = %r.hash_hex(),
            "ranked"
        ),
        None => debug!(id = %id, which, lo, hi, "empty range"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> TokenId {
        TokenId::new(s).unwrap()
    }

    fn name(s: &str) -> TokenName {
        TokenName::new(s).unwrap()
    }

    fn domain(low: u64, mid: u64, high: u64) -> Domain {
        Domain::new(low, mid, high).unwrap()
    }

    mod create {
        use super::*;

        #[test]
        fn inserts_with_zeroed_values() {
            let registry = TokenRegistry::new();
            let reply = registry.create(id("t1"), name("alice"), domain(0, 3, 6));

            assert_eq!(reply.outcome, Outcome::Created);
            assert_eq!(reply.tokens.len(), 1);
            let token = &reply.tokens[0];
            assert_eq!(token.partial_value, 0);
            assert_eq!(token.final_value, 0);
            assert_eq!(token.state, TokenState::Created);
            assert_eq!(reply.final_value, None);
        }

        #[test]
        fn duplicate_leaves_first_record() {
            let registry = TokenRegistry::new();
            registry.create(id("t1"), name("alice"), domain(0, 3, 6));
            let reply = registry.create(id("t1"), name("bob"), domain(1, 2, 3));

            assert_eq!(reply.outcome, Outcome::AlreadyExists);
            assert!(reply.message.contains("already exists"));
            assert_eq!(reply.tokens.len(), 1);
            assert_eq!(reply.tokens[0].name, name("alice"));
            assert_eq!(reply.tokens[0].domain, domain(0, 3, 6));
        }

        #[test]
        fn snapshot_is_ordered_by_id() {
            let registry = TokenRegistry::new();
            for key in ["c", "a", "b"] {
                registry.create(id(key), name("n"), domain(0, 0, 0));
            }
            let ids: Vec<_> = registry
                .snapshot()
                .into_iter()
                .map(|t| t.id.to_string())
                .collect();
            assert_eq!(ids, vec!["a", "b", "c"]);
        }
    }

    mod drop {
        use super::*;

        #[test]
        fn removes_token() {
            let registry = TokenRegistry::new();
            registry.create(id("t1"), name("alice"), domain(0, 3, 6));
            let reply = registry.drop(&id("t1"));

            assert_eq!(reply.outcome, Outcome::Dropped);
            assert!(reply.tokens.is_empty());
            assert!(registry.is_empty());
        }

        #[test]
        fn missing_is_not_found() {
            let registry = TokenRegistry::new();
            let reply = registry.drop(&id("nope"));
            assert_eq!(reply.outcome, Outcome::NotFound);
            assert!(reply.message.contains("not found"));
        }

        #[test]
        fn recreate_after_drop() {
            let registry = TokenRegistry::new();
            registry.create(id("t1"), name("alice"), domain(0, 3, 6));
            registry.drop(&id("t1"));
            let reply = registry.create(id("t1"), name("bob"), domain(0, 1, 2));
            assert_eq!(reply.outcome, Outcome::Created);
            assert_eq!(reply.tokens[0].name, name("bob"));
        }
    }

    mod write {
        use super::*;

        #[test]
        fn sets_partial_value() {
            let registry = TokenRegistry::new();
            registry.create(id("t1"), name("alice"), domain(0, 0, 0));
            let reply = registry.write(&id("t1"), name("alice"), domain(0, 5, 10));

            assert_eq!(reply.outcome, Outcome::Written);
            let token = &reply.tokens[0];
            assert_eq!(
                token.partial_value,
                ranker::rank_nonce("alice", 0, 5).unwrap()
            );
            assert_eq!(token.final_value, 0);
            assert_eq!(token.state, TokenState::Written);
        }

        #[test]
        fn resets_final_value() {
            let registry = TokenRegistry::new();
            registry.create(id("t1"), name("alice"), domain(0, 5, 10));
            registry.write(&id("t1"), name("alice"), domain(0, 5, 10));
            registry.read(&id("t1"));

            let reply = registry.write(&id("t1"), name("bob"), domain(0, 5, 10));
            let token = &reply.tokens[0];
            assert_eq!(token.final_value, 0);
            assert_eq!(token.name, name("bob"));
            assert_eq!(token.state, TokenState::Written);
        }

        #[test]
        fn empty_partial_range_is_zero() {
            let registry = TokenRegistry::new();
            registry.create(id("t1"), name("alice"), domain(0, 0, 0));
            let reply = registry.write(&id("t1"), name("alice"), domain(4, 4, 9));
            assert_eq!(reply.tokens[0].partial_value, 0);
        }

        #[test]
        fn missing_is_not_found() {
            let registry = TokenRegistry::new();
            let reply = registry.write(&id("nope"), name("alice"), domain(0, 1, 2));
            assert_eq!(reply.outcome, Outcome::NotFound);
            assert!(registry.is_empty());
        }
    }

    mod read {
        use super::*;

        #[test]
        fn sets_final_value() {
            let registry = TokenRegistry::new();
            registry.create(id("t1"), name("alice"), domain(0, 5, 10));
            registry.write(&id("t1"), name("alice"), domain(0, 5, 10));
            let reply = registry.read(&id("t1"));

            let expected = ranker::rank_nonce("alice", 5, 10).unwrap();
            assert_eq!(reply.outcome, Outcome::Finalized);
            assert_eq!(reply.final_value, Some(expected));
            assert_eq!(reply.tokens[0].final_value, expected);
            assert_eq!(reply.tokens[0].state, TokenState::Finalized);
        }

        #[test]
        fn does_not_touch_partial_value() {
            let registry = TokenRegistry::new();
            registry.create(id("t1"), name("alice"), domain(0, 5, 10));
            let written = registry.write(&id("t1"), name("alice"), domain(0, 5, 10));
            let read = registry.read(&id("t1"));
            assert_eq!(
                written.tokens[0].partial_value,
                read.tokens[0].partial_value
            );
        }

        #[test]
        fn final_value_is_not_clamped() {
            // Disjoint ranges [0,5) and [5,10): a clamp would force final <= partial.
            let registry = TokenRegistry::new();
            registry.create(id("t1"), name("alice"), domain(0, 5, 10));
            registry.write(&id("t1"), name("alice"), domain(0, 5, 10));
            let reply = registry.read(&id("t1"));
            let token = &reply.tokens[0];
            assert!(token.final_value >= 5);
            assert!(token.final_value > token.partial_value);
        }

        #[test]
        fn never_written_is_zero_range_noop() {
            let registry = TokenRegistry::new();
            registry.create(id("t1"), name("alice"), domain(0, 5, 10));
            let reply = registry.read(&id("t1"));

            assert_eq!(reply.outcome, Outcome::NotWritten);
            assert_eq!(reply.final_value, Some(0));
            assert_eq!(reply.tokens[0].final_value, 0);
            assert_eq!(reply.tokens[0].state, TokenState::Created);
            assert!(!reply.outcome.is_mutation());
        }

        #[test]
        fn empty_final_range_is_zero() {
            let registry = TokenRegistry::new();
            registry.create(id("t1"), name("alice"), domain(0, 0, 0));
            registry.write(&id("t1"), name("alice"), domain(0, 5, 5));
            let reply = registry.read(&id("t1"));
            assert_eq!(reply.outcome, Outcome::Finalized);
            assert_eq!(reply.final_value, Some(0));
        }

        #[test]
        fn read_is_repeatable() {
            let registry = TokenRegistry::new();
            registry.create(id("t1"), name("alice"), domain(0, 5, 10));
            registry.write(&id("t1"), name("alice"), domain(0, 5, 10));
            let first = registry.read(&id("t1"));
            let second = registry.read(&id("t1"));
            assert_eq!(first, second);
        }

        #[test]
        fn missing_is_not_found() {
            let registry = TokenRegistry::new();
            let reply = registry.read(&id("nope"));
            assert_eq!(reply.outcome, Outcome::NotFound);
            assert_eq!(reply.final_value, None);
        }
    }

    #[test]
    fn snapshots_are_detached() {
        let registry = TokenRegistry::new();
        registry.create(id("t1"), name("alice"), domain(0, 3, 6));
        let mut snap = registry.snapshot();
        snap[0].partial_value = 99;
        assert_eq!(registry.snapshot()[0].partial_value, 0);
    }

    #[test]
    fn end_to_end_example() {
        let registry = TokenRegistry::new();

        let reply = registry.create(id("t1"), name("alice"), domain(0, 3, 6));
        assert_eq!(reply.tokens.len(), 1);
        assert_eq!(reply.tokens[0].partial_value, 0);
        assert_eq!(reply.tokens[0].final_value, 0);

        let reply = registry.write(&id("t1"), name("alice"), domain(0, 3, 6));
        assert_eq!(
            reply.tokens[0].partial_value,
            ranker::rank_nonce("alice", 0, 3).unwrap()
        );

        let reply = registry.read(&id("t1"));
        assert_eq!(
            reply.final_value,
            Some(ranker::rank_nonce("alice", 3, 6).unwrap())
        );

        let reply = registry.drop(&id("t1"));
        assert!(reply.tokens.is_empty());
        assert_eq!(registry.read(&id("t1")).outcome, Outcome::NotFound);
    }
}
