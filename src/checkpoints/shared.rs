//! Shared checkpoint store
//!
//! Block validation reads the store continuously while checkpoint sync
//! occasionally writes to it. Reads run concurrently; file and TXT record
//! I/O happens before the write lock is taken.

use super::dns::{fetch_dns_records, TxtResolver};
use super::file::CheckpointFile;
use super::store::{CheckpointStatus, Checkpoints};
use super::CheckpointError;
use crate::crypto::Hash;
use crate::network::NetworkType;
use parking_lot::{RwLock, RwLockReadGuard};
use std::path::Path;
use std::sync::Arc;

/// Cloneable handle to a checkpoint store behind a reader-writer lock
#[derive(Debug, Clone, Default)]
pub struct SharedCheckpoints {
    inner: Arc<RwLock<Checkpoints>>,
}

impl SharedCheckpoints {
    pub fn new(checkpoints: Checkpoints) -> Self {
        Self {
            inner: Arc::new(RwLock::new(checkpoints)),
        }
    }

    /// Read access for several queries under one lock
    pub fn read(&self) -> RwLockReadGuard<'_, Checkpoints> {
        self.inner.read()
    }

    /// Copy of the current store
    pub fn snapshot(&self) -> Checkpoints {
        self.inner.read().clone()
    }

    pub fn check_block(&self, height: u64, hash: &Hash) -> CheckpointStatus {
        self.inner.read().check_block(height, hash)
    }

    pub fn is_in_checkpoint_zone(&self, height: u64) -> bool {
        self.inner.read().is_in_checkpoint_zone(height)
    }

    pub fn is_alternative_block_allowed(&self, blockchain_height: u64, block_height: u64) -> bool {
        self.inner
            .read()
            .is_alternative_block_allowed(blockchain_height, block_height)
    }

    pub fn max_height(&self) -> Option<u64> {
        self.inner.read().max_height()
    }

    pub fn add_checkpoint(&self, height: u64, hash_hex: &str) -> Result<(), CheckpointError> {
        self.inner.write().add_checkpoint(height, hash_hex)
    }

    /// Merge another store in; nothing changes on conflict.
    pub fn merge(&self, other: &Checkpoints) -> Result<(), CheckpointError> {
        self.inner.write().merge(other)
    }

    /// Same semantics as [`Checkpoints::load_new_checkpoints`], with the
    /// sources read before the write lock is taken.
    pub fn load_new_checkpoints<P: AsRef<Path>>(
        &self,
        path: P,
        network: NetworkType,
        resolver: Option<&dyn TxtResolver>,
    ) -> Result<(), CheckpointError> {
        let path = path.as_ref();
        let file = CheckpointFile::load(path);
        let records = resolver.map(|resolver| fetch_dns_records(network, resolver));

        let mut store = self.inner.write();
        let json_result = store.apply_json_source(path, file);
        let dns_result = match records {
            Some(records) => store.apply_dns_records(&records),
            None => Ok(()),
        };
        json_result.and(dns_result)
    }
}

impl From<Checkpoints> for SharedCheckpoints {
    fn from(checkpoints: Checkpoints) -> Self {
        Self::new(checkpoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoints::StaticTxtRecords;
    use std::thread;

    const HASH_A: &str = "e63c594189cc6e4d6f62cb0f81eb973b87b983b9e3aff432ae30b115f5e10d63";
    const HASH_B: &str = "40cf1fc3f9c423f35c883f934521bd6fd93fa63382d77f04fef6113cf9d6a887";

    #[test]
    fn test_concurrent_readers() {
        let shared = SharedCheckpoints::from(Checkpoints::for_network(NetworkType::Mainnet).unwrap());
        let expected = Hash::from_hex(HASH_A).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        assert!(shared.check_block(1, &expected).is_accepted());
                        assert!(shared.is_in_checkpoint_zone(5000));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_writes_visible_to_clones() {
        let shared = SharedCheckpoints::default();
        let reader = shared.clone();
        shared.add_checkpoint(42, HASH_A).unwrap();
        assert_eq!(reader.max_height(), Some(42));
        assert!(shared.add_checkpoint(42, HASH_B).is_err());
        assert_eq!(reader.read().get(42).unwrap().to_hex(), HASH_A);
    }

    #[test]
    fn test_load_new_checkpoints_combines_sources() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cp.json");
        std::fs::write(
            &path,
            format!(r#"{{"hashlines":[{{"height":100,"hash":"{}"}}]}}"#, HASH_A),
        )
        .unwrap();
        let resolver = StaticTxtRecords::new(vec![format!("200:{}", HASH_B)]);

        let shared = SharedCheckpoints::default();
        shared
            .load_new_checkpoints(&path, NetworkType::Testnet, Some(&resolver))
            .unwrap();
        let store = shared.snapshot();
        assert_eq!(store.len(), 2);
        assert_eq!(store.max_height(), Some(200));
    }

    #[test]
    fn test_load_new_checkpoints_without_dns() {
        let dir = tempfile::tempdir().unwrap();
        let shared = SharedCheckpoints::default();
        shared
            .load_new_checkpoints(dir.path().join("none.json"), NetworkType::Mainnet, None)
            .unwrap();
        assert!(shared.snapshot().is_empty());
    }

    #[test]
    fn test_json_error_still_attempts_dns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cp.json");
        std::fs::write(&path, "not json").unwrap();
        let resolver = StaticTxtRecords::new(vec![format!("300:{}", HASH_B)]);

        let shared = SharedCheckpoints::default();
        let result = shared.load_new_checkpoints(&path, NetworkType::Mainnet, Some(&resolver));
        assert!(matches!(result, Err(CheckpointError::Json(_))));
        assert_eq!(shared.max_height(), Some(300));
    }
}
