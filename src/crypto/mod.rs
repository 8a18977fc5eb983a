//! Cryptography module - block hash type and BLAKE3 hashing

mod hash;

pub use hash::*;
