//! Checkpoint store
//!
//! Ordered height -> hash pins. A pinned height can be re-added with the
//! same hash but never overwritten with a different one.

use super::dns::{fetch_dns_records, parse_txt_record, TxtResolver};
use super::file::CheckpointFile;
use super::CheckpointError;
use crate::crypto::Hash;
use crate::network::NetworkType;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Outcome of checking a block against the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointStatus {
    /// No checkpoint at this height; nothing to enforce
    NotCheckpointed,
    /// Checkpoint present and the hash matches
    Passed,
    /// Checkpoint present and the hash differs
    Failed { expected: Hash },
}

impl CheckpointStatus {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, CheckpointStatus::Failed { .. })
    }

    pub fn is_checkpoint(&self) -> bool {
        !matches!(self, CheckpointStatus::NotCheckpointed)
    }
}

/// Ordered set of checkpoints keyed by height
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checkpoints {
    points: BTreeMap<u64, Hash>,
}

impl Checkpoints {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the network's hard-coded checkpoints
    pub fn for_network(network: NetworkType) -> Result<Self, CheckpointError> {
        let mut checkpoints = Self::new();
        checkpoints.init_default_checkpoints(network)?;
        Ok(checkpoints)
    }

    /// Pin `height` to the hash encoded in `hash_hex`.
    pub fn add_checkpoint(&mut self, height: u64, hash_hex: &str) -> Result<(), CheckpointError> {
        let hash = Hash::from_hex(hash_hex).map_err(|source| {
            error!(height, hash = hash_hex, "failed to parse checkpoint hash");
            CheckpointError::InvalidHash {
                hash: hash_hex.to_string(),
                source,
            }
        })?;
        self.insert(height, hash)
    }

    /// Pin `height` to `hash`. Re-adding the same pair is a no-op.
    pub fn insert(&mut self, height: u64, hash: Hash) -> Result<(), CheckpointError> {
        if let Some(existing) = self.points.get(&height) {
            if *existing != hash {
                error!(height, %existing, new = %hash, "checkpoint conflicts with pinned hash");
                return Err(CheckpointError::Conflict {
                    height,
                    existing: *existing,
                    new: hash,
                });
            }
            return Ok(());
        }
        self.points.insert(height, hash);
        Ok(())
    }

    /// Whether `height` is at or below the highest checkpoint
    pub fn is_in_checkpoint_zone(&self, height: u64) -> bool {
        self.max_height().is_some_and(|max| height <= max)
    }

    /// Check a block hash against the checkpoint at `height`, if any.
    pub fn check_block(&self, height: u64, hash: &Hash) -> CheckpointStatus {
        match self.points.get(&height) {
            None => CheckpointStatus::NotCheckpointed,
            Some(expected) if expected == hash => {
                info!(height, %hash, "checkpoint passed");
                CheckpointStatus::Passed
            }
            Some(expected) => {
                warn!(height, %expected, fetched = %hash, "checkpoint failed");
                CheckpointStatus::Failed {
                    expected: *expected,
                }
            }
        }
    }

    /// Acceptance only, for callers that don't care whether a pin existed
    pub fn check_block_hash(&self, height: u64, hash: &Hash) -> bool {
        self.check_block(height, hash).is_accepted()
    }

    /// Whether an alternative block at `block_height` may extend an
    /// alternative chain while the main chain is at `blockchain_height`.
    ///
    /// Alternative chains may not rewrite history at or behind the most
    /// recent checkpoint not ahead of the main chain tip.
    pub fn is_alternative_block_allowed(&self, blockchain_height: u64, block_height: u64) -> bool {
        if block_height == 0 {
            return false;
        }
        match self.points.range(..=blockchain_height).next_back() {
            None => true,
            Some((&checkpoint_height, _)) => checkpoint_height < block_height,
        }
    }

    /// Highest checkpointed height, `None` when empty
    pub fn max_height(&self) -> Option<u64> {
        self.points.keys().next_back().copied()
    }

    /// Highest checkpointed height; an empty store is an error, never 0.
    pub fn get_max_height(&self) -> Result<u64, CheckpointError> {
        self.max_height().ok_or(CheckpointError::EmptyStore)
    }

    pub fn get(&self, height: u64) -> Option<&Hash> {
        self.points.get(&height)
    }

    pub fn points(&self) -> &BTreeMap<u64, Hash> {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Fail if any height in `other` is pinned here to a different hash.
    pub fn check_for_conflicts(&self, other: &Checkpoints) -> Result<(), CheckpointError> {
        for (height, hash) in &other.points {
            if let Some(existing) = self.points.get(height) {
                if existing != hash {
                    error!(height, %existing, new = %hash, "checkpoint sets conflict");
                    return Err(CheckpointError::Conflict {
                        height: *height,
                        existing: *existing,
                        new: *hash,
                    });
                }
            }
        }
        Ok(())
    }

    /// Union with `other`. Nothing is merged if any height conflicts.
    pub fn merge(&mut self, other: &Checkpoints) -> Result<(), CheckpointError> {
        self.check_for_conflicts(other)?;
        self.points
            .extend(other.points.iter().map(|(height, hash)| (*height, *hash)));
        Ok(())
    }

    /// Seed the store with the network's hard-coded table.
    pub fn init_default_checkpoints(&mut self, network: NetworkType) -> Result<(), CheckpointError> {
        for (height, hash) in network.default_checkpoints() {
            self.add_checkpoint(*height, hash)?;
        }
        Ok(())
    }

    /// Load checkpoints from a JSON file. A missing file is not an error.
    ///
    /// Heights at or below the current maximum are skipped as superseded.
    /// The batch is applied atomically: on any error the store is unchanged.
    pub fn load_checkpoints_from_json<P: AsRef<Path>>(&mut self, path: P) -> Result<(), CheckpointError> {
        let path = path.as_ref();
        let file = CheckpointFile::load(path);
        self.apply_json_source(path, file)
    }

    /// Load checkpoints published as `"<height>:<hash>"` TXT records.
    ///
    /// Malformed records are skipped. A failed fetch is logged and treated
    /// as success so startup never blocks on DNS.
    pub fn load_checkpoints_from_dns(
        &mut self,
        network: NetworkType,
        resolver: &dyn TxtResolver,
    ) -> Result<(), CheckpointError> {
        let records = fetch_dns_records(network, resolver);
        self.apply_dns_records(&records)
    }

    /// Load the JSON file, then TXT records when a resolver is given.
    ///
    /// Both sources are attempted; the first error is returned.
    pub fn load_new_checkpoints<P: AsRef<Path>>(
        &mut self,
        path: P,
        network: NetworkType,
        resolver: Option<&dyn TxtResolver>,
    ) -> Result<(), CheckpointError> {
        let json_result = self.load_checkpoints_from_json(path);
        let dns_result = match resolver {
            Some(resolver) => self.load_checkpoints_from_dns(network, resolver),
            None => Ok(()),
        };
        json_result.and(dns_result)
    }

    pub(crate) fn apply_json_source(
        &mut self,
        path: &Path,
        file: Result<Option<CheckpointFile>, CheckpointError>,
    ) -> Result<(), CheckpointError> {
        let file = match file {
            Ok(Some(file)) => file,
            Ok(None) => {
                debug!(path = %path.display(), "checkpoints file not found");
                return Ok(());
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "error loading checkpoints");
                return Err(e);
            }
        };

        let prev_max_height = self.max_height();
        debug!(?prev_max_height, path = %path.display(), "adding checkpoints from file");

        let mut staged = Checkpoints::new();
        for line in &file.hashlines {
            if prev_max_height.is_some_and(|max| line.height <= max) {
                debug!(height = line.height, "ignoring checkpoint height");
                continue;
            }
            debug!(height = line.height, hash = %line.hash, "adding checkpoint");
            staged.add_checkpoint(line.height, &line.hash)?;
        }
        self.merge(&staged)
    }

    pub(crate) fn apply_dns_records(&mut self, records: &[String]) -> Result<(), CheckpointError> {
        let mut staged = Checkpoints::new();
        for record in records {
            match parse_txt_record(record) {
                Some((height, hash)) => staged.insert(height, hash)?,
                None => debug!(record = %record, "skipping malformed checkpoint record"),
            }
        }
        self.merge(&staged)
    }
}
