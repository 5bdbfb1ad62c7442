//! Reclaiming UTxOs held by the protocol script.

use tracing::debug;

use teiki_protocol::data::encode;
use teiki_protocol::ledger::{ScriptKind, Utxo};
use teiki_protocol::transaction::TxBuilder;

use super::{governor_key_hash, inline_datum, reference_script};
use crate::context::ProtocolContext;
use crate::datums::ProtocolParamsDatum;
use crate::error::ActionError;
use crate::redeemers::ProtocolScriptRedeemer;

/// Spends `reclaim_utxos` from the protocol script under the governor's
/// signature.
///
/// The protocol script validates by reading the params UTxO (to learn who
/// the governor is) and checking that key signed, so both the params UTxO
/// and the script's reference UTxO are added as reference inputs.
///
/// # Errors
///
/// - [`ActionError::InvalidAmount`] if `reclaim_utxos` is empty.
/// - [`ActionError::MissingDatum`] / [`ActionError::Codec`] if the params
///   UTxO has no valid params datum.
/// - [`ActionError::UnsupportedAddressForm`] if the governor is a script.
/// - [`ActionError::InvalidReferenceScript`] if the script UTxO carries no
///   spending validator.
pub fn reclaim_protocol_script(
    ctx: &ProtocolContext,
    protocol_params_utxo: &Utxo,
    reclaim_utxos: Vec<Utxo>,
    protocol_script_ref_utxo: &Utxo,
) -> Result<TxBuilder, ActionError> {
    if reclaim_utxos.is_empty() {
        return Err(ActionError::InvalidAmount("nothing to reclaim".to_string()));
    }
    let params: ProtocolParamsDatum = inline_datum(protocol_params_utxo)?;
    let governor = governor_key_hash(&params)?;
    reference_script(protocol_script_ref_utxo, ScriptKind::Validator)?;

    debug!(
        governor = %governor,
        reclaimed = reclaim_utxos.len(),
        "building reclaim_protocol_script"
    );

    Ok(ctx
        .new_tx()
        .read_from([protocol_params_utxo.clone(), protocol_script_ref_utxo.clone()])
        .add_signer_key(governor)
        .collect_from(reclaim_utxos, Some(encode(&ProtocolScriptRedeemer))))
}
