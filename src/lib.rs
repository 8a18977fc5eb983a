//! Consensus gate core library
//!
//! The two checks that sit directly in the block-acceptance path:
//! checkpoint trust anchors and proof-of-work difficulty retargeting.

pub mod checkpoints;
pub mod consensus;
pub mod crypto;
pub mod network;

/// Protocol constants - HARD-CODED, NEVER CONFIGURABLE
pub mod constants {
    /// Target block time in seconds
    pub const DIFFICULTY_TARGET_V2: u64 = 120;

    /// Number of solve-time intervals in a retarget window
    pub const DIFFICULTY_WINDOW_V2: u64 = 60;

    /// Samples the chain must supply for a full retarget window
    pub const DIFFICULTY_BLOCKS_COUNT_V2: u64 = DIFFICULTY_WINDOW_V2 + 1;

    /// Difficulty returned by LWMA v2 before the chain has 4 blocks
    pub const BOOTSTRAP_DIFFICULTY_V2: u64 = 1;

    /// Difficulty guess returned by v3/v4 during chain startup
    pub const BOOTSTRAP_DIFFICULTY_GUESS: u64 = 100;

    /// Empirical correction applied to the LWMA v2 result
    pub const LWMA_V2_ADJUST: f64 = 0.998;

    /// Length of a hex-encoded block hash
    pub const HASH_HEX_LENGTH: usize = 64;
}
