//! Asset units and multi-asset values.
//!
//! An asset unit is a minting policy id (the hash of the policy script)
//! followed by a token name, with no separator. Units are always derived
//! through [`resolve_unit`]; nothing in the toolkit stores one that did not
//! come from a script hash.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{MAX_ASSET_NAME_LENGTH, SCRIPT_HASH_LENGTH};
use crate::crypto::hash::{Hash, ScriptHash};
use crate::data::{CodecError, PlutusData, PlutusType, Schema};

/// Errors from parsing asset names and units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitParseError {
    #[error("invalid hex in asset unit: {0}")]
    InvalidHex(String),

    #[error("asset name of {0} bytes exceeds the 32-byte limit")]
    NameTooLong(usize),

    #[error("asset unit shorter than a policy id")]
    MissingPolicy,
}

// ---------------------------------------------------------------------------
// AssetName
// ---------------------------------------------------------------------------

/// Token name under a minting policy, at most 32 bytes.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssetName(Vec<u8>);

impl AssetName {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, UnitParseError> {
        let bytes = bytes.into();
        if bytes.len() > MAX_ASSET_NAME_LENGTH {
            return Err(UnitParseError::NameTooLong(bytes.len()));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) if s.chars().all(|c| c.is_ascii_graphic()) => write!(f, "AssetName({:?})", s),
            _ => write!(f, "AssetName(0x{})", self.to_hex()),
        }
    }
}

impl PlutusType for AssetName {
    fn schema() -> Schema {
        Schema::BoundedBytes(MAX_ASSET_NAME_LENGTH)
    }

    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::Bytes(self.0.clone())
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        let bytes = data.as_bytes().ok_or_else(|| CodecError::SchemaMismatch {
            path: "AssetName".to_string(),
            expected: Self::schema().to_string(),
            found: data.kind(),
        })?;
        AssetName::new(bytes).map_err(|_| CodecError::SchemaMismatch {
            path: "AssetName".to_string(),
            expected: Self::schema().to_string(),
            found: data.kind(),
        })
    }
}

// ---------------------------------------------------------------------------
// AssetUnit
// ---------------------------------------------------------------------------

/// A policy-scoped asset: `policy_id || asset_name`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetUnit {
    pub policy_id: ScriptHash,
    pub asset_name: AssetName,
}

/// Derives the asset unit minted by the policy with hash `script_hash`.
///
/// Pure and injective in `script_hash`: for a fixed token name, two
/// different policies never share a unit. Callers must pass a hash computed
/// from a real script (see [`super::Script::hash`]); an arbitrary 28-byte
/// string is accepted here and rejected by the ledger later.
pub fn resolve_unit(script_hash: &ScriptHash, token_name: &AssetName) -> AssetUnit {
    AssetUnit {
        policy_id: *script_hash,
        asset_name: token_name.clone(),
    }
}

impl AssetUnit {
    /// Raw unit bytes, policy id first.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SCRIPT_HASH_LENGTH + self.asset_name.0.len());
        out.extend_from_slice(self.policy_id.as_bytes());
        out.extend_from_slice(self.asset_name.as_bytes());
        out
    }
}

impl fmt::Display for AssetUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.policy_id, self.asset_name.to_hex())
    }
}

impl fmt::Debug for AssetUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetUnit({})", self)
    }
}

impl FromStr for AssetUnit {
    type Err = UnitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| UnitParseError::InvalidHex(e.to_string()))?;
        if bytes.len() < SCRIPT_HASH_LENGTH {
            return Err(UnitParseError::MissingPolicy);
        }
        let (policy, name) = bytes.split_at(SCRIPT_HASH_LENGTH);
        Ok(AssetUnit {
            policy_id: Hash::from_slice(policy).map_err(|_| UnitParseError::MissingPolicy)?,
            asset_name: AssetName::new(name)?,
        })
    }
}

impl Serialize for AssetUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AssetUnit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Unit & Value
// ---------------------------------------------------------------------------

/// Key of a [`Value`]: the base currency or a native asset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Unit {
    Lovelace,
    Asset(AssetUnit),
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Lovelace => write!(f, "lovelace"),
            Unit::Asset(unit) => write!(f, "{}", unit),
        }
    }
}

impl FromStr for Unit {
    type Err = UnitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "lovelace" {
            return Ok(Unit::Lovelace);
        }
        Ok(Unit::Asset(s.parse()?))
    }
}

impl From<AssetUnit> for Unit {
    fn from(unit: AssetUnit) -> Self {
        Unit::Asset(unit)
    }
}

impl Serialize for Unit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Unit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Quantities per unit. Zero entries are never stored, so two values are
/// equal exactly when they hold the same amounts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Value(BTreeMap<Unit, u64>);

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Collected through `FromIterator` so zero entries are dropped.
        let entries = BTreeMap::<Unit, u64>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

impl Value {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn lovelace(amount: u64) -> Self {
        Self::zero().with(Unit::Lovelace, amount)
    }

    /// Returns `self` with `quantity` of `unit` added to it, saturating.
    pub fn with(mut self, unit: Unit, quantity: u64) -> Self {
        if quantity > 0 {
            let entry = self.0.entry(unit).or_insert(0);
            *entry = entry.saturating_add(quantity);
        }
        self
    }

    pub fn get(&self, unit: &Unit) -> u64 {
        self.0.get(unit).copied().unwrap_or(0)
    }

    pub fn lovelace_amount(&self) -> u64 {
        self.get(&Unit::Lovelace)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    /// True if the value holds anything besides lovelace.
    pub fn has_assets(&self) -> bool {
        self.0.keys().any(|u| *u != Unit::Lovelace)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Unit, &u64)> {
        self.0.iter()
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.0.keys()
    }

    /// Sum, or `None` on overflow.
    pub fn checked_add(&self, other: &Value) -> Option<Value> {
        let mut out = self.clone();
        for (unit, qty) in &other.0 {
            let entry = out.0.entry(unit.clone()).or_insert(0);
            *entry = entry.checked_add(*qty)?;
        }
        Some(out)
    }

    /// Difference, or the first unit whose quantity would go negative
    /// together with the amount required and the amount available.
    pub fn checked_sub(&self, other: &Value) -> Result<Value, (Unit, u64, u64)> {
        let mut out = self.clone();
        for (unit, qty) in &other.0 {
            let have = out.get(unit);
            if have < *qty {
                return Err((unit.clone(), *qty, have));
            }
            let rest = have - qty;
            if rest == 0 {
                out.0.remove(unit);
            } else {
                out.0.insert(unit.clone(), rest);
            }
        }
        Ok(out)
    }
}

impl FromIterator<(Unit, u64)> for Value {
    fn from_iter<I: IntoIterator<Item = (Unit, u64)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Value::zero(), |acc, (unit, qty)| acc.with(unit, qty))
    }
}
