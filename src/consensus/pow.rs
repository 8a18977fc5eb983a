//! Proof-of-work acceptance check
//!
//! A hash satisfies a difficulty when `hash * difficulty`, with the hash read
//! as a little-endian 256-bit integer, still fits in 256 bits.

use crate::consensus::wide::{carry_add, carry_add_with, mul128};
use crate::crypto::Hash;
use thiserror::Error;
use tracing::warn;

/// Proof-of-work errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PowError {
    #[error("hash {hash} does not satisfy difficulty {difficulty}")]
    InsufficientWork { hash: Hash, difficulty: u64 },
}

/// Check whether `hash` meets `difficulty`.
///
/// Runs once per candidate hash while mining, so the most significant word
/// is tested first: for a random hash that check fails almost always.
pub fn check_hash(hash: &Hash, difficulty: u64) -> bool {
    let words = hash.to_le_words();

    let (top, high) = mul128(words[3], difficulty);
    if high != 0 {
        return false;
    }

    let (_, cur) = mul128(words[0], difficulty);
    let (low, high) = mul128(words[1], difficulty);
    let carry = carry_add(cur, low);
    let cur = high;
    let (low, high) = mul128(words[2], difficulty);
    let carry = carry_add_with(cur, low, carry);
    let carry = carry_add_with(high, top, carry);
    !carry
}

/// Validate a block's proof of work, logging the rejected pair.
pub fn validate_pow(hash: &Hash, difficulty: u64) -> Result<(), PowError> {
    if check_hash(hash, difficulty) {
        return Ok(());
    }
    warn!(%hash, difficulty, "proof of work rejected");
    Err(PowError::InsufficientWork {
        hash: *hash,
        difficulty,
    })
}
