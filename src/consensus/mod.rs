//! Consensus module - proof-of-work check, wide arithmetic and difficulty retargeting

pub mod wide;
mod pow;
mod difficulty;
mod retarget;

pub use pow::*;
pub use difficulty::*;
pub use retarget::*;
