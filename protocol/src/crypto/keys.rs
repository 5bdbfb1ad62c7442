//! # Wallet Keys
//!
//! Ed25519 payment keys and the vkey witnesses they produce.
//!
//! Key management proper belongs to the wallet. This module only covers the
//! bits the toolkit must agree with the ledger on: how a verification key
//! becomes a [`KeyHash`], and what a witness over a transaction body looks
//! like.
//!
//! Key bytes are never logged.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::hash::{blake2b_224, KeyHash};

/// Errors that can occur during key operations.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not hex")]
    InvalidSecretKey,
}

/// An Ed25519 payment key.
///
/// Deliberately not `Serialize`: exporting secret material goes through
/// [`WalletKey::to_hex`] so it is always an explicit act.
pub struct WalletKey {
    signing_key: SigningKey,
}

/// A verification key plus its signature over a transaction body hash.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VKeyWitness {
    pub vkey: [u8; 32],
    pub signature: Vec<u8>,
}

impl WalletKey {
    /// Fresh key from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic key from a 32-byte seed. In Ed25519 the seed *is* the
    /// secret key.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Parses a hex-encoded 32-byte secret key.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidSecretKey)?;
        let seed: [u8; SECRET_KEY_LENGTH] =
            bytes.try_into().map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&seed))
    }

    /// Exports the secret key as hex. Handle with care.
    pub fn to_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    pub fn verifying_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// blake2b-224 of the verification key: the payment credential that
    /// appears in addresses and in `required_signers`.
    pub fn key_hash(&self) -> KeyHash {
        blake2b_224(&self.verifying_key_bytes())
    }

    /// Signs `message` (a transaction body hash) and packages the result as
    /// a witness.
    pub fn witness(&self, message: &[u8]) -> VKeyWitness {
        let signature = self.signing_key.sign(message);
        VKeyWitness {
            vkey: self.verifying_key_bytes(),
            signature: signature.to_bytes().to_vec(),
        }
    }
}

impl Clone for WalletKey {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for WalletKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WalletKey(key_hash={})", self.key_hash())
    }
}

impl VKeyWitness {
    /// The key hash this witness vouches for.
    pub fn key_hash(&self) -> KeyHash {
        blake2b_224(&self.vkey)
    }

    /// Checks the signature against `message`. Malformed keys or signatures
    /// verify as `false`, never panic.
    pub fn verify(&self, message: &[u8]) -> bool {
        let Ok(vkey) = VerifyingKey::from_bytes(&self.vkey) else {
            return false;
        };
        let Ok(sig_bytes) = <[u8; 64]>::try_from(self.signature.as_slice()) else {
            return false;
        };
        vkey.verify(message, &Signature::from_bytes(&sig_bytes)).is_ok()
    }
}

impl fmt::Debug for VKeyWitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VKeyWitness(key_hash={})", self.key_hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn witness_verifies_for_signed_message() {
        let key = WalletKey::generate();
        let w = key.witness(b"body hash");
        assert!(w.verify(b"body hash"));
        assert!(!w.verify(b"other body"));
        assert_eq!(w.key_hash(), key.key_hash());
    }

    #[test]
    fn hex_roundtrip_preserves_key_hash() {
        let key = WalletKey::from_seed(&[7u8; 32]);
        let restored = WalletKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(key.key_hash(), restored.key_hash());
    }

    #[test]
    fn short_hex_rejected() {
        assert!(WalletKey::from_hex("abcd").is_err());
        assert!(WalletKey::from_hex("zz").is_err());
    }

    #[test]
    fn tampered_signature_fails() {
        let key = WalletKey::from_seed(&[1u8; 32]);
        let mut w = key.witness(b"msg");
        w.signature[0] ^= 0xFF;
        assert!(!w.verify(b"msg"));
        w.signature.truncate(10);
        assert!(!w.verify(b"msg"));
    }
}
