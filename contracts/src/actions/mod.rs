//! # Protocol Actions
//!
//! One module per governance action. Every action is a pure function from
//! a [`crate::ProtocolContext`], already-resolved UTxOs and parameters to a
//! [`teiki_protocol::transaction::TxBuilder`] describing a transaction that
//! satisfies the action's on-chain preconditions. Nothing here touches the
//! ledger; the driver finalizes and submits.
//!
//! ```text
//! backing.rs  - create_backing
//! teiki.rs    - burn_teiki, evolve_teiki
//! reclaim.rs  - reclaim_protocol_script
//! proposal.rs - propose / apply / cancel protocol proposal
//! ```

pub mod backing;
pub mod proposal;
pub mod reclaim;
pub mod teiki;

pub use backing::create_backing;
pub use proposal::{apply_protocol_proposal, cancel_protocol_proposal, propose_protocol_proposal};
pub use reclaim::reclaim_protocol_script;
pub use teiki::{burn_teiki, evolve_teiki};

use teiki_protocol::crypto::hash::KeyHash;
use teiki_protocol::data::{decode, PlutusType};
use teiki_protocol::ledger::{Script, ScriptKind, Utxo};

use crate::datums::ProtocolParamsDatum;
use crate::error::ActionError;

/// The script attached to `utxo`, which must be of `kind`.
pub(crate) fn reference_script(utxo: &Utxo, kind: ScriptKind) -> Result<&Script, ActionError> {
    utxo.script_of_kind(kind)
        .ok_or(ActionError::InvalidReferenceScript {
            out_ref: utxo.out_ref,
            expected: kind,
        })
}

/// Decodes the inline datum of `utxo` as `T`.
pub(crate) fn inline_datum<T: PlutusType>(utxo: &Utxo) -> Result<T, ActionError> {
    let data = utxo
        .inline_datum()
        .ok_or(ActionError::MissingDatum(utxo.out_ref))?;
    Ok(decode(data)?)
}

/// The governor's payment key hash. Script-locked governors cannot sign.
pub(crate) fn governor_key_hash(params: &ProtocolParamsDatum) -> Result<KeyHash, ActionError> {
    params.governor_address.payment_key_hash().ok_or_else(|| {
        ActionError::UnsupportedAddressForm(
            "governor address has a script payment credential".to_string(),
        )
    })
}

/// Converts a positive token quantity into a negative mint delta.
pub(crate) fn burn_delta(amount: u64) -> Result<i64, ActionError> {
    if amount == 0 {
        return Err(ActionError::InvalidAmount("amount must be positive".to_string()));
    }
    i64::try_from(amount)
        .map(|a| -a)
        .map_err(|_| ActionError::InvalidAmount(format!("{} exceeds the mint range", amount)))
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! UTxO fixtures shared by the action tests.

    use teiki_protocol::config::NETWORK_ID_TESTNET;
    use teiki_protocol::crypto::hash::blake2b_256;
    use teiki_protocol::data::{encode, PlutusType};
    use teiki_protocol::ledger::{Address, OutRef, Script, TxOutput, Utxo, Value};

    pub fn out_ref(seed: &str) -> OutRef {
        OutRef::new(blake2b_256(seed.as_bytes()), 0)
    }

    pub fn validator(tag: u8) -> Script {
        Script::validator(vec![0x4e, tag])
    }

    pub fn script_address(script: &Script) -> Address {
        Address::from_script_hash(NETWORK_ID_TESTNET, script.hash())
    }

    /// UTxO at `address` holding `lovelace`, with `datum` inline.
    pub fn datum_utxo<T: PlutusType>(seed: &str, address: Address, datum: &T) -> Utxo {
        Utxo::from_output(
            out_ref(seed),
            TxOutput::new(address, Value::lovelace(2_000_000)).with_inline_datum(encode(datum)),
        )
    }

    /// UTxO publishing `script` as a reference script.
    pub fn script_utxo(seed: &str, script: Script) -> Utxo {
        let holder = Address::from_script_hash(NETWORK_ID_TESTNET, validator(0xff).hash());
        Utxo::from_output(
            out_ref(seed),
            TxOutput::new(holder, Value::lovelace(20_000_000)).with_script_ref(script),
        )
    }
}
