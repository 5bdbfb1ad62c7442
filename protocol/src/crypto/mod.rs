//! # Cryptographic Primitives
//!
//! Thin, typed wrappers around audited implementations: blake2b for every
//! ledger digest and Ed25519 for payment keys. Nothing here is novel, and
//! nothing here should be.

pub mod hash;
pub mod keys;

pub use hash::{blake2b_224, blake2b_256, DatumHash, Hash, KeyHash, ScriptHash, TxHash};
pub use keys::{KeyError, VKeyWitness, WalletKey};
