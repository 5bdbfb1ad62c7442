//! # Transaction Module
//!
//! Construction and finalization of ledger transactions.
//!
//! ## Architecture
//!
//! ```text
//! builder.rs - Fluent TxBuilder accumulating inputs, outputs, mints, signers
//! body.rs    - TxBody, its canonical CBOR encoding, Transaction, Redeemer
//! error.rs   - TxBuildError
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Describe**: an action module (or any caller) drives a [`TxBuilder`].
//! 2. **Complete**: [`TxBuilder::complete`] checks witnesses, settles the
//!    fee and balances the value, yielding a [`Transaction`].
//! 3. **Sign & submit**: a [`crate::ledger::LedgerClient`] adds signatures
//!    over the id and hands the transaction to the ledger.
//!
//! The id is `blake2b_256` of the body encoding, so it is known before any
//! signature exists and never changes afterwards.

pub mod body;
pub mod builder;
pub mod error;

pub use body::{Redeemer, RedeemerPurpose, Transaction, TxBody};
pub use builder::TxBuilder;
pub use error::TxBuildError;
