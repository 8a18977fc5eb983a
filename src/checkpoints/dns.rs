//! Checkpoints published as DNS TXT records
//!
//! Resolution itself belongs to the caller; this module only selects the
//! domains and parses the `"<height>:<hex hash>"` strings that come back.

use crate::crypto::Hash;
use crate::network::NetworkType;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// TXT record fetch errors
#[derive(Debug, Error)]
pub enum DnsError {
    #[error("no TXT records resolved from {0} domains")]
    Unavailable(usize),
    #[error("TXT record source error: {0}")]
    Io(#[from] std::io::Error),
    #[error("resolver error: {0}")]
    Resolver(String),
}

/// Source of TXT records for a set of domains
pub trait TxtResolver {
    fn load_txt_records(&self, domains: &[&str]) -> Result<Vec<String>, DnsError>;
}

impl<F> TxtResolver for F
where
    F: Fn(&[&str]) -> Result<Vec<String>, DnsError>,
{
    fn load_txt_records(&self, domains: &[&str]) -> Result<Vec<String>, DnsError> {
        self(domains)
    }
}

/// Records supplied up front, e.g. fetched out of band or read from a file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticTxtRecords {
    records: Vec<String>,
}

impl StaticTxtRecords {
    pub fn new(records: Vec<String>) -> Self {
        Self { records }
    }

    /// One record per non-empty line
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DnsError> {
        let contents = fs::read_to_string(path)?;
        let records = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        Ok(Self { records })
    }
}

impl TxtResolver for StaticTxtRecords {
    fn load_txt_records(&self, domains: &[&str]) -> Result<Vec<String>, DnsError> {
        if self.records.is_empty() {
            return Err(DnsError::Unavailable(domains.len()));
        }
        Ok(self.records.clone())
    }
}

/// Parse a `"<height>:<hex hash>"` record; `None` if either half is malformed.
pub fn parse_txt_record(record: &str) -> Option<(u64, Hash)> {
    let (height, hash) = record.split_once(':')?;
    let height = height.trim().parse::<u64>().ok()?;
    let hash = Hash::from_hex(hash).ok()?;
    Some((height, hash))
}

/// Fetch the network's checkpoint records. Failure yields no records.
pub fn fetch_dns_records(network: NetworkType, resolver: &dyn TxtResolver) -> Vec<String> {
    let domains = network.dns_checkpoint_domains();
    match resolver.load_txt_records(domains) {
        Ok(records) => {
            debug!(%network, count = records.len(), "fetched checkpoint records");
            records
        }
        Err(e) => {
            warn!(%network, error = %e, "failed to fetch checkpoint records, continuing without them");
            Vec::new()
        }
    }
}
