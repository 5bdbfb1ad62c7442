//! # Schema Codec
//!
//! Plutus data, its canonical CBOR encoding, and the typed layer that maps
//! datums and redeemers onto it.
//!
//! ```text
//! plutus.rs - PlutusData and the byte-level encoder/decoder
//! schema.rs - Schema descriptions and the conformance checker
//! codec.rs  - PlutusType trait, encode/decode, primitive mappings
//! ```
//!
//! The round-trip laws the rest of the toolkit leans on:
//!
//! - `decode::<T>(&encode(&x)) == Ok(x)` for every `x: T`.
//! - `deserialize(&serialize(&d)) == Ok(d)` for every `d`.

pub mod codec;
pub mod plutus;
pub mod schema;

use thiserror::Error;

pub use codec::{
    decode, deserialize, encode, from_cbor, serialize, to_cbor, unknown_variant, variant_of,
    Fields, PlutusType,
};
pub use plutus::PlutusData;
pub use schema::{Field, Schema, Variant};

/// Errors from the Schema Codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The data is well-formed but does not have the declared shape.
    #[error("schema mismatch at {path}: expected {expected}, found {found}")]
    SchemaMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// The bytes are not a valid Plutus data encoding.
    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),
}
