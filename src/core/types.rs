//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`TokenId`] - Non-empty registry key
//! - [`TokenName`] - Non-empty hash-search seed
//! - [`Domain`] - Ordered `(low, mid, high)` search bounds
//!
//! # Validation
//!
//! These types enforce validity at construction time. A `Domain` with
//! inverted bounds cannot be represented, so the registry never sees one.
//!
//! # Examples
//!
//! ```
//! use tokenreg::core::types::{Domain, TokenId, TokenName};
//!
//! // Valid constructions
//! let id = TokenId::new("t1").unwrap();
//! let name = TokenName::new("alice").unwrap();
//! let domain = Domain::new(0, 3, 6).unwrap();
//! assert_eq!(domain.partial_range(), (0, 3));
//!
//! // Invalid constructions fail at creation time
//! assert!(TokenId::new("").is_err());
//! assert!(Domain::new(5, 3, 6).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid token id: {0}")]
    InvalidTokenId(String),

    #[error("invalid token name: {0}")]
    InvalidTokenName(String),

    #[error("invalid domain: low={low}, mid={mid}, high={high} (expected low <= mid <= high)")]
    InvalidDomain { low: u64, mid: u64, high: u64 },
}

/// A validated token identifier.
///
/// Identifiers are opaque strings. The only rules are that they cannot be
/// empty and cannot contain control characters (they end up on a single
/// console line).
///
/// # Example
///
/// ```
/// use tokenreg::core::types::TokenId;
///
/// let id = TokenId::new("t1").unwrap();
/// assert_eq!(id.as_str(), "t1");
///
/// assert!(TokenId::new("").is_err());
/// assert!(TokenId::new("a\nb").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenId(String);

impl TokenId {
    /// Create a new validated token id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidTokenId` if the id is empty or contains
    /// control characters.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::InvalidTokenId("token id cannot be empty".into()));
        }
        if id.chars().any(|c| c.is_control()) {
            return Err(TypeError::InvalidTokenId(
                "token id cannot contain control characters".into(),
            ));
        }
        Ok(Self(id))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TokenId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<TokenId> for String {
    fn from(id: TokenId) -> Self {
        id.0
    }
}

impl AsRef<str> for TokenId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated token name, used as the seed of the hash search.
///
/// Names may contain spaces; the hashed message is `"<name> <nonce>"`, so
/// the only hard rule is non-emptiness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenName(String);

impl TokenName {
    /// Create a new validated token name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidTokenName` if the name is empty or
    /// contains control characters.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TypeError::InvalidTokenName(
                "token name cannot be empty".into(),
            ));
        }
        if name.chars().any(|c| c.is_control()) {
            return Err(TypeError::InvalidTokenName(
                "token name cannot contain control characters".into(),
            ));
        }
        Ok(Self(name))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TokenName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<TokenName> for String {
    fn from(name: TokenName) -> Self {
        name.0
    }
}

impl AsRef<str> for TokenName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TokenName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Search bounds of a token, split into a partial and a final sub-range.
///
/// Invariant: `low <= mid <= high`. The partial range is `[low, mid)` and
/// the final range is `[mid, high)`; either may be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDomain", into = "RawDomain")]
pub struct Domain {
    low: u64,
    mid: u64,
    high: u64,
}

/// Unvalidated wire shape of a [`Domain`].
#[derive(Serialize, Deserialize)]
struct RawDomain {
    low: u64,
    mid: u64,
    high: u64,
}

impl Domain {
    /// Create a new validated domain.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidDomain` if the bounds are not ordered.
    /// Inverted bounds are rejected, never clamped.
    pub fn new(low: u64, mid: u64, high: u64) -> Result<Self, TypeError> {
        if low > mid || mid > high {
            return Err(TypeError::InvalidDomain { low, mid, high });
        }
        Ok(Self { low, mid, high })
    }

    /// The all-zero domain.
    pub fn zero() -> Self {
        Self {
            low: 0,
            mid: 0,
            high: 0,
        }
    }

    pub fn low(&self) -> u64 {
        self.low
    }

    pub fn mid(&self) -> u64 {
        self.mid
    }

    pub fn high(&self) -> u64 {
        self.high
    }

    /// Half-open range searched for the partial value: `[low, mid)`.
    pub fn partial_range(&self) -> (u64, u64) {
        (self.low, self.mid)
    }

    /// Half-open range searched for the final value: `[mid, high)`.
    pub fn final_range(&self) -> (u64, u64) {
        (self.mid, self.high)
    }
}

impl Default for Domain {
    fn default() -> Self {
        Self::zero()
    }
}

impl TryFrom<RawDomain> for Domain {
    type Error = TypeError;

    fn try_from(raw: RawDomain) -> Result<Self, Self::Error> {
        Self::new(raw.low, raw.mid, raw.high)
    }
}

impl From<Domain> for RawDomain {
    fn from(d: Domain) -> Self {
        RawDomain {
            low: d.low,
            mid: d.mid,
            high: d.high,
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}, {}]", self.low, self.mid, self.high)
    }
}
