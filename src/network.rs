//! Network profiles
//!
//! Static per-network configuration: the hard-coded checkpoint table and
//! the TXT-record domains that publish newer checkpoints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which chain the node is following
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    #[default]
    Mainnet,
    Testnet,
    Stagenet,
    /// Local development chain
    Fakechain,
    Undefined,
}

/// Mainnet checkpoint domains, all DNSSEC-signed
pub const MAINNET_DNS_DOMAINS: &[&str] = &[
    "ck.saronite.info",
    "ck.saronite.io",
    "ck2.saronite.info",
    "ck2.saronite.io",
];

pub const TESTNET_DNS_DOMAINS: &[&str] = &[
    "tck.saronite.info",
    "tck2.saronite.info",
    "tck.saronite.io",
    "tck2.saronite.io",
];

pub const STAGENET_DNS_DOMAINS: &[&str] = &[
    "sck.saronite.info",
    "sck2.saronite.info",
    "sck.saronite.io",
    "sck2.saronite.io",
];

/// Hard-coded mainnet checkpoints: (height, block hash)
pub const MAINNET_CHECKPOINTS: &[(u64, &str)] = &[
    (1, "e63c594189cc6e4d6f62cb0f81eb973b87b983b9e3aff432ae30b115f5e10d63"),
    (150, "40cf1fc3f9c423f35c883f934521bd6fd93fa63382d77f04fef6113cf9d6a887"),
    (300, "0a1c76baca667f7f87c04e86b0aad150277fc643a1d78763d95c0679493d4235"),
    (450, "f282ed97a947ab7102ab1ce5cf1b773b6173b1479461d4f3f925370a75922776"),
    (600, "dc7130ec8f96b8634dd3dd6c24662a728fe62d3d04f745d156320a0b2a0c5d6e"),
    (750, "ab4800f2fa32e3e10f7343651cd6541cdc2cbcfd79b17d67a66da55a02392ef4"),
    (900, "8d0e6d6fdc27d21c20b3140c5cfe6b5d59d65fa9f17d2930b99a433f160f9c6c"),
    (1200, "810eb6151a18b0e15c674e2932463694f0f4e3e208f82980856bd8b720f6936a"),
    (1500, "fbd3c8e6bf2b9d3736a43bf0e55267a52b64bb868a7932c5c4d8f9db68b4ebcb"),
    (1800, "ca680200c06f8ad4f29c5a275c6f01f6e99815a45953e41f9411398ec7721455"),
    (2100, "e3a683c8b94a9a9a843ba0e47724fc0845b5fa489213a9206b752c79cc05e7c5"),
    (2500, "cee897a08b05f332eb759800d5839f7029bc24298f936e4b3e26a22fe4334144"),
    (3000, "f245e68186cc366f2852b2506ef8090cf169fe4210c774b21a2896fd9bf66fd2"),
    (3500, "2382af55c01383c52497f30ab66e1102c426b07bef9c7f2d1853d4a992c75c2e"),
    (4000, "0fb9b6a263de6f06ede4e23bdbbb371ebe74b601f8d4682ee2d1407fc64f9742"),
    (4500, "08a8210c95b34772d516010d255578ef324ea099c9ef6a53f45a49119b8b80cb"),
    (5000, "cabe945ec7df9730639f6990cc908ae6939933a304ce6aaa0db3a0bdc3998821"),
    (5500, "06a62e9aeaa7d4540c4b39d082f5d7a181f395f6554c2baae8ca513e0e356cc6"),
    (6000, "33d5b9ce9eb332d9b9633302f488fe162d2f0464fceb2419a738a2028f0ba8ee"),
    (6500, "b197bbee7a880b9ddc3760646433b5ddd7d9baf34fe8dad64fa55541912534ec"),
    (7000, "6bcf592d69e3d2b1de5cda7e7bd8201086fb4ccbc63bc2d25e30614e0d433d0a"),
    (7500, "3f964e43830817104cecd85dd4952f458fe3d1bcc31a6366ae36a4634d1e0e95"),
    (8000, "fc1a70613aca87a2f5fcaeebeb6af7b95147524c81ee34a729dbf947a91ea921"),
    (8500, "99c80779191001af3a05ca84031890af71bc312e6798a9db9489a4b3607fed4e"),
    (9000, "34d681367dbcfb8eb3c9b47777d7db3c3b1976b092ec496f4a37b220a09baa87"),
    (9500, "80e4bcc413f196f92e51ba1ddfbf7323df817d9516f90a6e4c2a7de9f410211e"),
    (10000, "9640445ae7509b545b5131c6021cc9f46b57f1c8293d623e65a15c8a5dcdb079"),
];

impl NetworkType {
    /// Domains queried for checkpoint TXT records.
    ///
    /// Networks without their own list fall back to the mainnet domains.
    pub fn dns_checkpoint_domains(&self) -> &'static [&'static str] {
        match self {
            NetworkType::Testnet => TESTNET_DNS_DOMAINS,
            NetworkType::Stagenet => STAGENET_DNS_DOMAINS,
            NetworkType::Mainnet | NetworkType::Fakechain | NetworkType::Undefined => {
                MAINNET_DNS_DOMAINS
            }
        }
    }

    /// Hard-coded checkpoints for this network
    pub fn default_checkpoints(&self) -> &'static [(u64, &'static str)] {
        match self {
            NetworkType::Mainnet => MAINNET_CHECKPOINTS,
            _ => &[],
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NetworkType::Mainnet => "mainnet",
            NetworkType::Testnet => "testnet",
            NetworkType::Stagenet => "stagenet",
            NetworkType::Fakechain => "fakechain",
            NetworkType::Undefined => "undefined",
        };
        f.write_str(name)
    }
}

impl FromStr for NetworkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(NetworkType::Mainnet),
            "testnet" => Ok(NetworkType::Testnet),
            "stagenet" => Ok(NetworkType::Stagenet),
            "fakechain" | "devnet" => Ok(NetworkType::Fakechain),
            "undefined" => Ok(NetworkType::Undefined),
            other => Err(format!("unknown network: {}", other)),
        }
    }
}
