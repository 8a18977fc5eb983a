//! Checkpoints module - height-to-hash trust anchors and their sources

mod dns;
mod file;
mod shared;
mod store;

pub use dns::*;
pub use file::*;
pub use shared::*;
pub use store::*;

use crate::crypto::Hash;
use thiserror::Error;

/// Checkpoint errors
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("invalid checkpoint hash {hash:?}: {source}")]
    InvalidHash {
        hash: String,
        #[source]
        source: hex::FromHexError,
    },
    #[error("checkpoint at height {height} is pinned to {existing}, refusing {new}")]
    Conflict { height: u64, existing: Hash, new: Hash },
    #[error("checkpoint store is empty")]
    EmptyStore,
    #[error("checkpoint file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed checkpoint file: {0}")]
    Json(#[from] serde_json::Error),
}
