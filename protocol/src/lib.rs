// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Teiki Protocol: Transaction Construction Core
//!
//! The protocol-agnostic half of the Teiki toolkit: everything needed to
//! describe, balance and submit a transaction on a UTxO ledger whose
//! validators read Plutus data. The Teiki-specific datums, redeemers and
//! actions live in `teiki-contracts` on top of this crate.
//!
//! ## Architecture
//!
//! - **config**: Protocol constants and the ledger parameters used for
//!   fees and balancing.
//! - **crypto**: blake2b hashes and ed25519 wallet keys.
//! - **data**: Plutus data, its canonical CBOR form, and the schema-checked
//!   typed codec.
//! - **ledger**: Addresses, values, scripts, UTxOs, the `LedgerClient`
//!   trait and an in-memory emulator.
//! - **transaction**: `TxBuilder` and the finalized `Transaction`.
//!
//! ## Ground Rules
//!
//! 1. Building is pure. Only `LedgerClient` methods suspend.
//! 2. Every datum is schema-checked before it becomes a typed value.
//! 3. Failures are typed enums, never panics. Nothing retries.

pub mod config;
pub mod crypto;
pub mod data;
pub mod ledger;
pub mod transaction;

pub use config::LedgerParams;
pub use data::{CodecError, PlutusData, PlutusType, Schema};
pub use ledger::{Address, LedgerClient, LedgerError, OutRef, Script, Utxo, Value};
pub use transaction::{Transaction, TxBuildError, TxBuilder};
