//! Output references, outputs, and resolved UTxOs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::address::Address;
use super::script::{Script, ScriptKind};
use super::value::Value;
use crate::config::TX_HASH_LENGTH;
use crate::crypto::hash::{DatumHash, TxHash};
use crate::data::{CodecError, Field, Fields, PlutusData, PlutusType, Schema};

/// Errors from parsing `<tx_id>#<index>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutRefParseError {
    #[error("expected <tx_id>#<index>, got {0:?}")]
    MissingSeparator(String),

    #[error("invalid transaction id: {0}")]
    InvalidTxId(String),

    #[error("invalid output index: {0}")]
    InvalidIndex(String),
}

// ---------------------------------------------------------------------------
// OutRef
// ---------------------------------------------------------------------------

/// Pointer to a ledger output: the producing transaction and the position
/// of the output within it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutRef {
    pub tx_id: TxHash,
    pub index: u32,
}

impl OutRef {
    pub fn new(tx_id: TxHash, index: u32) -> Self {
        Self { tx_id, index }
    }
}

impl fmt::Display for OutRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_id, self.index)
    }
}

impl fmt::Debug for OutRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutRef({})", self)
    }
}

impl FromStr for OutRef {
    type Err = OutRefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tx, idx) = s
            .split_once('#')
            .ok_or_else(|| OutRefParseError::MissingSeparator(s.to_string()))?;
        let tx_id = tx
            .parse()
            .map_err(|e: crate::crypto::hash::HashParseError| {
                OutRefParseError::InvalidTxId(e.to_string())
            })?;
        let index = idx
            .parse()
            .map_err(|_| OutRefParseError::InvalidIndex(idx.to_string()))?;
        Ok(Self { tx_id, index })
    }
}

impl Serialize for OutRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for OutRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Plutus V2 `TxOutRef = Constr 0 [TxId, Integer]` with
/// `TxId = Constr 0 [ByteString]`.
impl PlutusType for OutRef {
    fn schema() -> Schema {
        Schema::record(
            "TxOutRef",
            vec![
                Field::new(
                    "tx_id",
                    Schema::record(
                        "TxId",
                        vec![Field::new("hash", Schema::FixedBytes(TX_HASH_LENGTH))],
                    ),
                ),
                Field::new("index", Schema::Integer),
            ],
        )
    }

    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![
                PlutusData::constr(0, vec![self.tx_id.to_plutus_data()]),
                PlutusData::Integer(i128::from(self.index)),
            ],
        )
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        let mut f = Fields::of(data, "TxOutRef", 0)?;
        let tx_id_data: PlutusData = f.next()?;
        let mut tx_id_fields = Fields::of(&tx_id_data, "TxId", 0)?;
        let tx_id = tx_id_fields.next()?;
        let index: u64 = f.next()?;
        let index = u32::try_from(index).map_err(|_| CodecError::SchemaMismatch {
            path: "TxOutRef.index".to_string(),
            expected: "u32 output index".to_string(),
            found: index.to_string(),
        })?;
        Ok(Self { tx_id, index })
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Datum attached to an output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatumOption {
    /// Only the hash is on-chain; the spender supplies the datum.
    Hash(DatumHash),
    Inline(PlutusData),
}

/// An output before it has a reference: what a transaction produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub address: Address,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datum: Option<DatumOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_ref: Option<Script>,
}

impl TxOutput {
    pub fn new(address: Address, value: Value) -> Self {
        Self {
            address,
            value,
            datum: None,
            script_ref: None,
        }
    }

    pub fn with_inline_datum(mut self, datum: PlutusData) -> Self {
        self.datum = Some(DatumOption::Inline(datum));
        self
    }

    pub fn with_script_ref(mut self, script: Script) -> Self {
        self.script_ref = Some(script);
        self
    }
}

/// A resolved output: reference plus contents. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub out_ref: OutRef,
    pub address: Address,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datum: Option<DatumOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_ref: Option<Script>,
}

impl Utxo {
    pub fn from_output(out_ref: OutRef, output: TxOutput) -> Self {
        Self {
            out_ref,
            address: output.address,
            value: output.value,
            datum: output.datum,
            script_ref: output.script_ref,
        }
    }

    /// The output part, without its reference.
    pub fn to_output(&self) -> TxOutput {
        TxOutput {
            address: self.address,
            value: self.value.clone(),
            datum: self.datum.clone(),
            script_ref: self.script_ref.clone(),
        }
    }

    /// The inline datum, if the output carries one.
    pub fn inline_datum(&self) -> Option<&PlutusData> {
        match &self.datum {
            Some(DatumOption::Inline(d)) => Some(d),
            _ => None,
        }
    }

    /// The attached script, only if it is of the requested kind.
    pub fn script_of_kind(&self, kind: ScriptKind) -> Option<&Script> {
        self.script_ref.as_ref().filter(|s| s.is_kind(kind))
    }
}
