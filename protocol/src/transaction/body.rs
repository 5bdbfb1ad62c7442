//! Finalized transactions and their canonical body encoding.
//!
//! The body is encoded as a CBOR map keyed by the ledger's field numbers.
//! The transaction id is `blake2b_256(body_cbor)`, so it is fixed once
//! the builder completes and signing never changes it.

use minicbor::data::Tag;
use minicbor::encode::Write;
use minicbor::Encoder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::crypto::hash::{blake2b_256, Hash, KeyHash, ScriptHash, TxHash};
use crate::crypto::keys::VKeyWitness;
use crate::data::plutus::encode_data;
use crate::data::PlutusData;
use crate::ledger::{AssetUnit, DatumOption, OutRef, Script, TxOutput, Unit, Value};

use super::TxBuildError;

type EncodeResult<W> = Result<(), minicbor::encode::Error<<W as Write>::Error>>;

/// CBOR tag for embedded CBOR bytes.
const TAG_ENCODED_CBOR: u64 = 24;

// ---------------------------------------------------------------------------
// Redeemers
// ---------------------------------------------------------------------------

/// What a redeemer unlocks.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedeemerPurpose {
    Spend(OutRef),
    Mint(ScriptHash),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redeemer {
    pub purpose: RedeemerPurpose,
    pub data: PlutusData,
}

// ---------------------------------------------------------------------------
// TxBody
// ---------------------------------------------------------------------------

/// The signed part of a transaction.
///
/// Inputs and reference inputs are kept sorted so the encoding (and hence
/// the id) does not depend on the order the builder saw them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxBody {
    pub inputs: Vec<OutRef>,
    pub reference_inputs: Vec<OutRef>,
    pub outputs: Vec<TxOutput>,
    pub fee: u64,
    pub mint: BTreeMap<AssetUnit, i64>,
    pub required_signers: Vec<KeyHash>,
    /// Lower validity bound, POSIX milliseconds.
    pub valid_from: Option<u64>,
    /// Upper validity bound, POSIX milliseconds.
    pub valid_to: Option<u64>,
    /// Hash over the redeemers, present when any script runs.
    pub script_data_hash: Option<Hash<32>>,
}

impl TxBody {
    pub fn to_cbor(&self) -> Vec<u8> {
        let mut encoder = Encoder::new(Vec::new());
        self.encode(&mut encoder).expect("writing CBOR into a Vec cannot fail");
        encoder.into_writer()
    }

    pub fn hash(&self) -> TxHash {
        blake2b_256(&self.to_cbor())
    }

    /// Minting policies in the order the ledger indexes them.
    pub fn mint_policies(&self) -> Vec<ScriptHash> {
        let mut policies: Vec<ScriptHash> = self.mint.keys().map(|u| u.policy_id).collect();
        policies.dedup();
        policies
    }

    fn encode<W: Write>(&self, e: &mut Encoder<W>) -> EncodeResult<W> {
        let entries = 3
            + u64::from(self.valid_to.is_some())
            + u64::from(self.valid_from.is_some())
            + u64::from(!self.mint.is_empty())
            + u64::from(self.script_data_hash.is_some())
            + u64::from(!self.required_signers.is_empty())
            + u64::from(!self.reference_inputs.is_empty());
        e.map(entries)?;

        e.u8(0)?;
        encode_out_refs(&self.inputs, e)?;

        e.u8(1)?.array(self.outputs.len() as u64)?;
        for output in &self.outputs {
            encode_output(output, e)?;
        }

        e.u8(2)?.u64(self.fee)?;

        if let Some(slot) = self.valid_to {
            e.u8(3)?.u64(slot)?;
        }
        if let Some(slot) = self.valid_from {
            e.u8(8)?.u64(slot)?;
        }
        if !self.mint.is_empty() {
            e.u8(9)?;
            encode_mint(&self.mint, e)?;
        }
        if let Some(hash) = &self.script_data_hash {
            e.u8(11)?.bytes(hash.as_bytes())?;
        }
        if !self.required_signers.is_empty() {
            e.u8(14)?.array(self.required_signers.len() as u64)?;
            for signer in &self.required_signers {
                e.bytes(signer.as_bytes())?;
            }
        }
        if !self.reference_inputs.is_empty() {
            e.u8(18)?;
            encode_out_refs(&self.reference_inputs, e)?;
        }
        Ok(())
    }
}

fn encode_out_refs<W: Write>(refs: &[OutRef], e: &mut Encoder<W>) -> EncodeResult<W> {
    e.array(refs.len() as u64)?;
    for r in refs {
        e.array(2)?.bytes(r.tx_id.as_bytes())?.u32(r.index)?;
    }
    Ok(())
}

fn encode_output<W: Write>(output: &TxOutput, e: &mut Encoder<W>) -> EncodeResult<W> {
    let entries =
        2 + u64::from(output.datum.is_some()) + u64::from(output.script_ref.is_some());
    e.map(entries)?;
    e.u8(0)?.bytes(&output.address.to_bytes())?;
    e.u8(1)?;
    encode_value(&output.value, e)?;
    match &output.datum {
        Some(DatumOption::Hash(hash)) => {
            e.u8(2)?.array(2)?.u8(0)?.bytes(hash.as_bytes())?;
        }
        Some(DatumOption::Inline(data)) => {
            e.u8(2)?.array(2)?.u8(1)?;
            e.tag(Tag::new(TAG_ENCODED_CBOR))?.bytes(&data.to_cbor())?;
        }
        None => {}
    }
    if let Some(script) = &output.script_ref {
        let mut inner = Encoder::new(Vec::new());
        inner
            .array(2)
            .and_then(|e| e.u8(2))
            .and_then(|e| e.bytes(&script.bytes))
            .expect("writing CBOR into a Vec cannot fail");
        e.u8(3)?
            .tag(Tag::new(TAG_ENCODED_CBOR))?
            .bytes(&inner.into_writer())?;
    }
    Ok(())
}

fn encode_value<W: Write>(value: &Value, e: &mut Encoder<W>) -> EncodeResult<W> {
    if !value.has_assets() {
        e.u64(value.lovelace_amount())?;
        return Ok(());
    }
    let mut assets: BTreeMap<ScriptHash, Vec<(&[u8], u64)>> = BTreeMap::new();
    for (unit, qty) in value.iter() {
        if let Unit::Asset(asset) = unit {
            assets
                .entry(asset.policy_id)
                .or_default()
                .push((asset.asset_name.as_bytes(), *qty));
        }
    }
    e.array(2)?.u64(value.lovelace_amount())?;
    e.map(assets.len() as u64)?;
    for (policy, names) in &assets {
        e.bytes(policy.as_bytes())?.map(names.len() as u64)?;
        for (name, qty) in names {
            e.bytes(name)?.u64(*qty)?;
        }
    }
    Ok(())
}

fn encode_mint<W: Write>(mint: &BTreeMap<AssetUnit, i64>, e: &mut Encoder<W>) -> EncodeResult<W> {
    let mut grouped: BTreeMap<ScriptHash, Vec<(&[u8], i64)>> = BTreeMap::new();
    for (unit, qty) in mint {
        grouped
            .entry(unit.policy_id)
            .or_default()
            .push((unit.asset_name.as_bytes(), *qty));
    }
    e.map(grouped.len() as u64)?;
    for (policy, names) in &grouped {
        e.bytes(policy.as_bytes())?.map(names.len() as u64)?;
        for (name, qty) in names {
            e.bytes(name)?.i64(*qty)?;
        }
    }
    Ok(())
}

/// Hash binding the redeemers to the body. Redeemers are encoded as
/// `[tag, index, data, [0, 0]]` where `index` points into the sorted inputs
/// (tag 0) or the sorted minting policies (tag 1).
pub(crate) fn script_data_hash(
    body: &TxBody,
    redeemers: &[Redeemer],
) -> Result<Option<Hash<32>>, TxBuildError> {
    if redeemers.is_empty() {
        return Ok(None);
    }
    let policies = body.mint_policies();
    let pointers = redeemers
        .iter()
        .map(|r| redeemer_pointer(body, &policies, &r.purpose))
        .collect::<Result<Vec<_>, _>>()?;

    let mut encoder = Encoder::new(Vec::new());
    encode_redeemers(&pointers, redeemers, &mut encoder)
        .expect("writing CBOR into a Vec cannot fail");
    Ok(Some(blake2b_256(&encoder.into_writer())))
}

/// `(tag, index)` locating what `purpose` unlocks within the body.
fn redeemer_pointer(
    body: &TxBody,
    policies: &[ScriptHash],
    purpose: &RedeemerPurpose,
) -> Result<(u8, u64), TxBuildError> {
    let found = match purpose {
        RedeemerPurpose::Spend(r) => body.inputs.binary_search(r).map(|i| (0u8, i)),
        RedeemerPurpose::Mint(p) => policies.binary_search(p).map(|i| (1u8, i)),
    };
    match found {
        Ok((tag, index)) => Ok((tag, index as u64)),
        Err(_) => Err(TxBuildError::UnboundRedeemer(match purpose {
            RedeemerPurpose::Spend(r) => format!("spending {}", r),
            RedeemerPurpose::Mint(p) => format!("minting under {}", p),
        })),
    }
}

fn encode_redeemers<W: Write>(
    pointers: &[(u8, u64)],
    redeemers: &[Redeemer],
    e: &mut Encoder<W>,
) -> EncodeResult<W> {
    e.array(redeemers.len() as u64)?;
    for ((tag, index), redeemer) in pointers.iter().zip(redeemers) {
        e.array(4)?.u8(*tag)?.u64(*index)?;
        encode_data(&redeemer.data, e)?;
        e.array(2)?.u8(0)?.u8(0)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A finalized transaction: body, id, script witnesses, and the signatures
/// collected so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxHash,
    pub body: TxBody,
    pub redeemers: Vec<Redeemer>,
    pub scripts: Vec<Script>,
    #[serde(default)]
    pub signatures: Vec<VKeyWitness>,
}

impl Transaction {
    /// Seals `body`: binds the redeemers and derives the id.
    pub(crate) fn assemble(
        mut body: TxBody,
        redeemers: Vec<Redeemer>,
        scripts: Vec<Script>,
    ) -> Result<Self, TxBuildError> {
        body.script_data_hash = script_data_hash(&body, &redeemers)?;
        Ok(Self {
            id: body.hash(),
            body,
            redeemers,
            scripts,
            signatures: Vec::new(),
        })
    }

    pub fn fee(&self) -> u64 {
        self.body.fee
    }

    /// Adds a signature over the id, replacing any earlier one from the
    /// same key.
    pub fn add_signature(&mut self, witness: VKeyWitness) {
        self.signatures.retain(|w| w.vkey != witness.vkey);
        self.signatures.push(witness);
    }

    /// True if a valid signature from `key_hash` over the id is attached.
    pub fn is_signed_by(&self, key_hash: &KeyHash) -> bool {
        self.signatures
            .iter()
            .any(|w| w.key_hash() == *key_hash && w.verify(self.id.as_bytes()))
    }

    pub fn redeemer(&self, purpose: &RedeemerPurpose) -> Option<&PlutusData> {
        self.redeemers
            .iter()
            .find(|r| r.purpose == *purpose)
            .map(|r| &r.data)
    }

    /// Mint delta for `unit`, zero if the transaction does not touch it.
    pub fn minted(&self, unit: &AssetUnit) -> i64 {
        self.body.mint.get(unit).copied().unwrap_or(0)
    }
}
