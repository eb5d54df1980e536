//! Property-based tests for the hash ranker and domain types.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use proptest::prelude::*;

use tokenreg::core::ranker::{self, RangeError};
use tokenreg::core::registry::{Outcome, TokenRegistry};
use tokenreg::core::types::{Domain, TokenId, TokenName};

/// Strategy for token names.
fn token_name() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _-]{1,24}"
}

/// Strategy for small ranges `(lo, hi)` with `lo <= hi`.
fn small_range() -> impl Strategy<Value = (u64, u64)> {
    (0u64..1_000_000, 0u64..64).prop_map(|(lo, len)| (lo, lo + len))
}

/// Strategy for ordered domains with short sub-ranges.
fn small_domain() -> impl Strategy<Value = (u64, u64, u64)> {
    (0u64..1_000_000, 0u64..32, 0u64..32).prop_map(|(low, a, b)| (low, low + a, low + a + b))
}

/// Reference argmin: first nonce with the strictly smallest hash.
fn naive_argmin(name: &str, lo: u64, hi: u64) -> Option<u64> {
    let mut best: Option<(u64, u64)> = None;
    for nonce in lo..hi {
        let h = ranker::hash(name, nonce);
        if best.map_or(true, |(_, bh)| h < bh) {
            best = Some((nonce, h));
        }
    }
    best.map(|(n, _)| n)
}

proptest! {
    #[test]
    fn rank_result_in_range(name in token_name(), (lo, hi) in small_range()) {
        match ranker::rank(&name, lo, hi).unwrap() {
            Some(r) => {
                prop_assert!(lo <= r.nonce && r.nonce < hi);
                prop_assert_eq!(r.hash, ranker::hash(&name, r.nonce));
            }
            None => prop_assert_eq!(lo, hi),
        }
    }

    #[test]
    fn rank_matches_naive_argmin(name in token_name(), (lo, hi) in small_range()) {
        let got = ranker::rank(&name, lo, hi).unwrap().map(|r| r.nonce);
        prop_assert_eq!(got, naive_argmin(&name, lo, hi));
    }

    #[test]
    fn winner_hash_is_minimal(name in token_name(), (lo, hi) in small_range()) {
        if let Some(r) = ranker::rank(&name, lo, hi).unwrap() {
            for nonce in lo..hi {
                prop_assert!(r.hash <= ranker::hash(&name, nonce));
            }
        }
    }

    #[test]
    fn hash_is_deterministic(name in token_name(), nonce in any::<u64>()) {
        prop_assert_eq!(ranker::hash(&name, nonce), ranker::hash(&name, nonce));
    }

    #[test]
    fn inverted_range_rejected(name in token_name(), lo in 1u64..u64::MAX, gap in 1u64..1000) {
        let hi = lo.saturating_sub(gap);
        prop_assert_eq!(
            ranker::rank(&name, lo, hi),
            Err(RangeError::Inverted { lo, hi })
        );
    }

    #[test]
    fn domain_accepts_only_ordered(low in any::<u64>(), mid in any::<u64>(), high in any::<u64>()) {
        let ordered = low <= mid && mid <= high;
        prop_assert_eq!(Domain::new(low, mid, high).is_ok(), ordered);
    }

    #[test]
    fn write_then_read_stays_in_sub_ranges(name in token_name(), (low, mid, high) in small_domain()) {
        let registry = TokenRegistry::new();
        let id = TokenId::new("t").unwrap();
        let domain = Domain::new(low, mid, high).unwrap();
        let token_name = TokenName::new(name.clone()).unwrap();

        registry.create(id.clone(), token_name.clone(), domain);
        let written = registry.write(&id, token_name, domain);
        prop_assert_eq!(written.outcome, Outcome::Written);
        let partial = written.tokens[0].partial_value;
        if low < mid {
            prop_assert!(low <= partial && partial < mid);
        } else {
            prop_assert_eq!(partial, 0);
        }

        let read = registry.read(&id);
        let final_value = read.final_value.unwrap();
        if mid < high {
            prop_assert!(mid <= final_value && final_value < high);
        } else {
            prop_assert_eq!(final_value, 0);
        }
        prop_assert_eq!(final_value, ranker::rank_nonce(&name, mid, high).unwrap());
    }
}
