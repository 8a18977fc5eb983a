//! JSON checkpoint file
//!
//! Format: `{"hashlines": [{"height": 1, "hash": "<64 hex chars>"}, ...]}`

use super::store::Checkpoints;
use super::CheckpointError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// A single checkpoint record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashLine {
    pub height: u64,
    pub hash: String,
}

/// The checkpoint file contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointFile {
    pub hashlines: Vec<HashLine>,
}

impl CheckpointFile {
    /// Read and parse a checkpoint file; `Ok(None)` if it does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>, CheckpointError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Write the file as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl From<&Checkpoints> for CheckpointFile {
    fn from(checkpoints: &Checkpoints) -> Self {
        let hashlines = checkpoints
            .points()
            .iter()
            .map(|(height, hash)| HashLine {
                height: *height,
                hash: hash.to_hex(),
            })
            .collect();
        Self { hashlines }
    }
}

impl Checkpoints {
    /// Write every checkpoint to `path` in the JSON file format
    pub fn save_checkpoints_to_json<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        CheckpointFile::from(self).save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkType;

    const HASH_A: &str = "e63c594189cc6e4d6f62cb0f81eb973b87b983b9e3aff432ae30b115f5e10d63";
    const HASH_B: &str = "40cf1fc3f9c423f35c883f934521bd6fd93fa63382d77f04fef6113cf9d6a887";

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert_eq!(CheckpointFile::load(&path).unwrap(), None);

        let mut cp = Checkpoints::new();
        assert!(cp.load_checkpoints_from_json(&path).is_ok());
        assert!(cp.is_empty());
    }

    #[test]
    fn test_parse_record_list() {
        let dir = tempfile::tempdir().unwrap();
        let json = format!(
            r#"{{"hashlines":[{{"height":10,"hash":"{}"}},{{"height":20,"hash":"{}"}}]}}"#,
            HASH_A, HASH_B
        );
        let path = write(&dir, "cp.json", &json);
        let file = CheckpointFile::load(&path).unwrap().unwrap();
        assert_eq!(file.hashlines.len(), 2);
        assert_eq!(file.hashlines[1].height, 20);
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "bad.json", "{\"hashlines\": [ {\"height\": \"x\"} ]");
        let mut cp = Checkpoints::new();
        assert!(matches!(
            cp.load_checkpoints_from_json(&path),
            Err(CheckpointError::Json(_))
        ));
    }

    #[test]
    fn test_heights_at_or_below_max_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut cp = Checkpoints::for_network(NetworkType::Mainnet).unwrap();
        // 9000 conflicts with the hard-coded table but is superseded, not rejected.
        let json = format!(
            r#"{{"hashlines":[{{"height":9000,"hash":"{}"}},{{"height":10000,"hash":"{}"}},{{"height":20000,"hash":"{}"}}]}}"#,
            HASH_A, HASH_A, HASH_B
        );
        let path = write(&dir, "cp.json", &json);
        cp.load_checkpoints_from_json(&path).unwrap();
        assert_eq!(cp.len(), 28);
        assert_eq!(cp.get(20000).unwrap().to_hex(), HASH_B);
        assert_ne!(cp.get(9000).unwrap().to_hex(), HASH_A);
    }

    #[test]
    fn test_conflicting_file_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut cp = Checkpoints::new();
        cp.add_checkpoint(5, HASH_A).unwrap();
        let before = cp.clone();
        let json = format!(
            r#"{{"hashlines":[{{"height":10,"hash":"{}"}},{{"height":10,"hash":"{}"}}]}}"#,
            HASH_A, HASH_B
        );
        let path = write(&dir, "cp.json", &json);
        assert!(cp.load_checkpoints_from_json(&path).is_err());
        assert_eq!(cp, before);
    }

    #[test]
    fn test_bad_hash_in_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "cp.json", r#"{"hashlines":[{"height":10,"hash":"1234"}]}"#);
        let mut cp = Checkpoints::new();
        assert!(matches!(
            cp.load_checkpoints_from_json(&path),
            Err(CheckpointError::InvalidHash { .. })
        ));
        assert!(cp.is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.json");
        let original = Checkpoints::for_network(NetworkType::Mainnet).unwrap();
        original.save_checkpoints_to_json(&path).unwrap();

        let mut reloaded = Checkpoints::new();
        reloaded.load_checkpoints_from_json(&path).unwrap();
        assert_eq!(reloaded, original);
    }
}
