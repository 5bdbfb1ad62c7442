//! # Ledger Model
//!
//! Everything the toolkit knows about the ledger it builds transactions for:
//! addresses, values and asset units, scripts, UTxOs, and the client that
//! resolves and submits against a live (or emulated) ledger.
//!
//! ```text
//! address.rs  - Shelley addresses, credentials, the Plutus address schema
//! value.rs    - AssetName, AssetUnit, resolve_unit, multi-asset Value
//! script.rs   - Plutus V2 scripts and their hashes
//! utxo.rs     - OutRef, TxOutput, Utxo
//! client.rs   - LedgerClient trait and LedgerError
//! emulator.rs - in-memory LedgerClient backed by a JSON snapshot
//! ```

pub mod address;
pub mod client;
pub mod emulator;
pub mod script;
pub mod utxo;
pub mod value;

pub use address::{Address, AddressError, Credential, PlutusAddress, StakeCredential};
pub use client::{LedgerClient, LedgerError};
pub use emulator::{Emulator, LedgerSnapshot};
pub use script::{Script, ScriptKind};
pub use utxo::{DatumOption, OutRef, OutRefParseError, TxOutput, Utxo};
pub use value::{resolve_unit, AssetName, AssetUnit, Unit, UnitParseError, Value};
