//! core::ranker
//!
//! Brute-force hash minimization over a nonce range.
//!
//! # Algorithm
//!
//! For each `x` in `[lo, hi)`, in increasing order, compute
//! `h(x) = be_u64(SHA-256("<name> <x>")[..8])` and keep the `x` with the
//! strictly smallest hash. Ties keep the first nonce seen.
//!
//! The registry stores the winning **nonce**. The winning hash is carried on
//! [`Ranked`] for diagnostics only.
//!
//! # Example
//!
//! ```
//! use tokenreg::core::ranker;
//!
//! let best = ranker::rank("alice", 0, 5).unwrap().unwrap();
//! assert!(best.nonce < 5);
//! assert_eq!(best.hash, ranker::hash("alice", best.nonce));
//!
//! // Empty range: no candidate, not an error
//! assert_eq!(ranker::rank("alice", 5, 5).unwrap(), None);
//! ```

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from ranking.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("inverted range: lo={lo} > hi={hi}")]
    Inverted { lo: u64, hi: u64 },
}

/// Winner of a range scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranked {
    /// Nonce that produced the smallest hash.
    pub nonce: u64,
    /// The hash itself.
    pub hash: u64,
}

impl Ranked {
    /// Hash as a zero-padded hex string, for logs.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash.to_be_bytes())
    }
}

/// Hash a `(name, nonce)` pair.
///
/// Returns the first eight bytes of `SHA-256("<name> <nonce>")` read as a
/// big-endian integer.
pub fn hash(name: &str, nonce: u64) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(b" ");
    hasher.update(nonce.to_string().as_bytes());
    let digest = hasher.finalize();

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// Find the nonce in `[lo, hi)` minimizing [`hash`].
///
/// Returns `Ok(None)` for an empty range without scanning.
///
/// # Errors
///
/// Returns [`RangeError::Inverted`] if `lo > hi`.
pub fn rank(name: &str, lo: u64, hi: u64) -> Result<Option<Ranked>, RangeError> {
    if lo > hi {
        return Err(RangeError::Inverted { lo, hi });
    }
    Ok(scan(name, lo, hi))
}

/// Nonce winning [`rank`], or 0 for an empty range.
///
/// # Errors
///
/// Returns [`RangeError::Inverted`] if `lo > hi`.
pub fn rank_nonce(name: &str, lo: u64, hi: u64) -> Result<u64, RangeError> {
    Ok(rank(name, lo, hi)?.map_or(0, |r| r.nonce))
}

/// Unchecked scan. An inverted range is simply empty here; callers holding
/// a validated `Domain` use this directly.
pub(crate) fn scan(name: &str, lo: u64, hi: u64) -> Option<Ranked> {
    let mut best: Option<Ranked> = None;
    for nonce in lo..hi {
        let h = hash(name, nonce);
        match best {
            Some(b) if h >= b.hash => {}
            _ => best = Some(Ranked { nonce, hash: h }),
        }
    }
    best
}
