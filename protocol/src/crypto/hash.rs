//! # Hashing Utilities
//!
//! The ledger uses exactly two digests and so do we:
//!
//! - **blake2b-224**: key hashes and script hashes (28 bytes). Every
//!   credential and every minting policy id is one of these.
//! - **blake2b-256**: transaction ids and datum hashes (32 bytes).
//!
//! Digests are wrapped in a fixed-width [`Hash<N>`] so a 28-byte policy id
//! can never be passed where a 32-byte transaction id is expected.

use blake2::digest::consts::{U28, U32};
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{KEY_HASH_LENGTH, TX_HASH_LENGTH};

type Blake2b224 = Blake2b<U28>;
type Blake2b256 = Blake2b<U32>;

/// Errors from parsing a hex-encoded digest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashParseError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid digest length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
}

/// A fixed-width digest.
///
/// Serializes as a lowercase hex string so ledger snapshots and logs stay
/// readable.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash<const N: usize>([u8; N]);

/// Hash of a verification key (payment or stake credential).
pub type KeyHash = Hash<KEY_HASH_LENGTH>;

/// Hash of a script. For minting policies this is also the policy id.
pub type ScriptHash = Hash<KEY_HASH_LENGTH>;

/// Transaction id.
pub type TxHash = Hash<TX_HASH_LENGTH>;

/// Hash of a datum stored by reference instead of inline.
pub type DatumHash = Hash<TX_HASH_LENGTH>;

impl<const N: usize> Hash<N> {
    pub const fn new(bytes: [u8; N]) -> Self {
        Self(bytes)
    }

    /// Builds a digest from a slice, checking the width.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, HashParseError> {
        let arr: [u8; N] = bytes.try_into().map_err(|_| HashParseError::InvalidLength {
            expected: N,
            got: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl<const N: usize> AsRef<[u8]> for Hash<N> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl<const N: usize> From<[u8; N]> for Hash<N> {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes)
    }
}

impl<const N: usize> FromStr for Hash<N> {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| HashParseError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl<const N: usize> fmt::Display for Hash<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl<const N: usize> fmt::Debug for Hash<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash<{}>({})", N, self.to_hex())
    }
}

impl<const N: usize> Serialize for Hash<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de, const N: usize> Deserialize<'de> for Hash<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// blake2b-224 of `data`. Used for key hashes and script hashes.
pub fn blake2b_224(data: &[u8]) -> Hash<28> {
    let mut hasher = Blake2b224::new();
    hasher.update(data);
    let mut out = [0u8; 28];
    out.copy_from_slice(&hasher.finalize());
    Hash(out)
}

/// blake2b-256 of `data`. Used for transaction ids and datum hashes.
pub fn blake2b_256(data: &[u8]) -> Hash<32> {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    Hash(out)
}
