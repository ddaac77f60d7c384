//! Static registry of the supported key algorithms and their sizes.
//!
//! The catalog order is stable: it drives menu navigation in the
//! interactive front end and is the authoritative source of default sizes.

use crate::error::{KeygenError, KeygenResult};
use std::fmt;
use std::str::FromStr;

/// A supported key algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Rsa,
    Ed25519,
    Ecdsa,
}

impl Algorithm {
    /// Upper-case display name ("RSA", "ED25519", "ECDSA").
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Rsa => "RSA",
            Algorithm::Ed25519 => "ED25519",
            Algorithm::Ecdsa => "ECDSA",
        }
    }

    /// File stem used for the default key paths (`id_rsa`, `id_ed25519`, ...).
    pub fn default_file_stem(self) -> &'static str {
        match self {
            Algorithm::Rsa => "id_rsa",
            Algorithm::Ed25519 => "id_ed25519",
            Algorithm::Ecdsa => "id_ecdsa",
        }
    }

    /// Catalog entry for this algorithm.
    pub fn spec(self) -> &'static AlgorithmSpec {
        spec(self)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = KeygenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rsa" => Ok(Algorithm::Rsa),
            "ed25519" => Ok(Algorithm::Ed25519),
            "ecdsa" => Ok(Algorithm::Ecdsa),
            other => Err(KeygenError::Validation(format!(
                "unsupported algorithm: {other} (supported: rsa, ed25519, ecdsa)"
            ))),
        }
    }
}

/// Immutable description of one algorithm.
#[derive(Debug)]
pub struct AlgorithmSpec {
    pub algorithm: Algorithm,
    /// Human description shown in the selection menu.
    pub description: &'static str,
    /// Allowed key sizes in bits, ascending.
    pub key_sizes: &'static [u32],
    pub default_size: u32,
}

impl AlgorithmSpec {
    pub fn allows(&self, size: u32) -> bool {
        self.key_sizes.contains(&size)
    }
}

static ALGORITHMS: [AlgorithmSpec; 3] = [
    AlgorithmSpec {
        algorithm: Algorithm::Rsa,
        description: "RSA - Rivest-Shamir-Adleman (Most compatible)",
        key_sizes: &[2048, 3072, 4096, 8192],
        default_size: 4096,
    },
    AlgorithmSpec {
        algorithm: Algorithm::Ed25519,
        description: "ED25519 - Edwards-curve Digital Signature Algorithm (Modern, Fast)",
        key_sizes: &[256],
        default_size: 256,
    },
    AlgorithmSpec {
        algorithm: Algorithm::Ecdsa,
        description: "ECDSA - Elliptic Curve Digital Signature Algorithm (Modern, Efficient)",
        key_sizes: &[256, 384, 521],
        default_size: 256,
    },
];

/// All supported algorithms in menu order.
pub fn list_algorithms() -> &'static [AlgorithmSpec] {
    &ALGORITHMS
}

/// Catalog entry for an algorithm.
pub fn spec(algorithm: Algorithm) -> &'static AlgorithmSpec {
    match algorithm {
        Algorithm::Rsa => &ALGORITHMS[0],
        Algorithm::Ed25519 => &ALGORITHMS[1],
        Algorithm::Ecdsa => &ALGORITHMS[2],
    }
}

/// Validate a requested size and return the size that will actually be used.
///
/// ED25519 has no size degree of freedom: any request resolves to 256.
pub fn validate(algorithm: Algorithm, size: u32) -> KeygenResult<u32> {
    let spec = spec(algorithm);
    if algorithm == Algorithm::Ed25519 {
        return Ok(spec.default_size);
    }
    if spec.allows(size) {
        Ok(size)
    } else {
        let supported: Vec<String> = spec.key_sizes.iter().map(u32::to_string).collect();
        Err(KeygenError::Validation(format!(
            "unsupported {algorithm} key size: {size} (supported: {})",
            supported.join(", ")
        )))
    }
}
