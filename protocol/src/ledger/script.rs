//! Plutus scripts attached to outputs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::config::PLUTUS_V2_SCRIPT_TAG;
use crate::crypto::hash::{blake2b_224, ScriptHash};

/// What a script validates. The ledger does not record this, but every
/// script in the protocol is compiled for exactly one purpose, and using a
/// spending validator as a minting policy (or vice versa) only fails once
/// the transaction reaches the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptKind {
    MintingPolicy,
    Validator,
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MintingPolicy => write!(f, "minting policy"),
            Self::Validator => write!(f, "spending validator"),
        }
    }
}

/// A Plutus V2 script: flat-encoded program bytes plus its purpose.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Script {
    pub kind: ScriptKind,
    #[serde(serialize_with = "to_hex", deserialize_with = "from_hex")]
    pub bytes: Vec<u8>,
}

impl Script {
    pub fn new(kind: ScriptKind, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            bytes: bytes.into(),
        }
    }

    pub fn minting_policy(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(ScriptKind::MintingPolicy, bytes)
    }

    pub fn validator(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(ScriptKind::Validator, bytes)
    }

    /// `blake2b_224(0x02 || bytes)`. For a minting policy this is the
    /// policy id.
    pub fn hash(&self) -> ScriptHash {
        let mut preimage = Vec::with_capacity(1 + self.bytes.len());
        preimage.push(PLUTUS_V2_SCRIPT_TAG);
        preimage.extend_from_slice(&self.bytes);
        blake2b_224(&preimage)
    }

    pub fn is_kind(&self, kind: ScriptKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Script({}, hash={}, {} bytes)",
            self.kind,
            self.hash(),
            self.bytes.len()
        )
    }
}

fn to_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}

fn from_hex<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let s = String::deserialize(deserializer)?;
    hex::decode(s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_depends_on_language_tag_and_bytes() {
        let script = Script::minting_policy(vec![1, 2, 3]);
        assert_eq!(script.hash(), blake2b_224(&[0x02, 1, 2, 3]));
        assert_ne!(script.hash(), blake2b_224(&[1, 2, 3]));
    }

    #[test]
    fn kind_does_not_change_hash() {
        let a = Script::minting_policy(vec![9]);
        let b = Script::validator(vec![9]);
        assert_eq!(a.hash(), b.hash());
        assert!(a.is_kind(ScriptKind::MintingPolicy));
        assert!(!b.is_kind(ScriptKind::MintingPolicy));
    }

    #[test]
    fn serde_roundtrip() {
        let script = Script::validator(vec![0xde, 0xad]);
        let json = serde_json::to_string(&script).unwrap();
        assert!(json.contains("\"dead\""));
        assert!(json.contains("\"validator\""));
        let back: Script = serde_json::from_str(&json).unwrap();
        assert_eq!(back, script);
    }
}
