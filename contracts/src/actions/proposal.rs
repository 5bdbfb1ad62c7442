//! Protocol parameter proposals.
//!
//! A change to the protocol params goes through the proposal UTxO in three
//! steps. The governor proposes new params against the current params UTxO,
//! waits out `proposal_waiting_period`, then anyone applies it. The governor
//! may cancel a pending proposal at any point before it is applied.
//!
//! The proposal UTxO is never consumed for good: every step spends it and
//! pays it back to the same address with the same value and an updated
//! datum.

use tracing::debug;

use teiki_protocol::data::encode;
use teiki_protocol::ledger::{ScriptKind, TxOutput, Utxo};
use teiki_protocol::transaction::TxBuilder;

use super::{governor_key_hash, inline_datum, reference_script};
use crate::context::ProtocolContext;
use crate::datums::{ProposedParams, ProtocolParamsDatum, ProtocolProposalDatum};
use crate::error::ActionError;
use crate::redeemers::{ProtocolParamsRedeemer, ProtocolProposalRedeemer};

/// The proposal UTxO paid back with `proposal` as its new datum.
fn reemit(proposal_utxo: &Utxo, proposal: Option<ProposedParams>) -> TxOutput {
    TxOutput::new(proposal_utxo.address, proposal_utxo.value.clone())
        .with_inline_datum(encode(&ProtocolProposalDatum { proposal }))
}

// ---------------------------------------------------------------------------
// Propose
// ---------------------------------------------------------------------------

/// Records `proposed_params` as the pending proposal, to take effect no
/// earlier than `in_effect_at`.
///
/// The transaction must land at least `proposal_waiting_period` before
/// `in_effect_at`, so its validity interval is closed at that point.
///
/// # Errors
///
/// - [`ActionError::MissingDatum`] / [`ActionError::Codec`] if either UTxO
///   lacks its datum.
/// - [`ActionError::UnsupportedAddressForm`] if the governor is a script.
/// - [`ActionError::InvalidReferenceScript`] if `proposal_script_ref`
///   carries no spending validator.
/// - [`ActionError::InvalidAmount`] if `in_effect_at` falls inside the
///   waiting period counted from the epoch.
pub fn propose_protocol_proposal(
    ctx: &ProtocolContext,
    proposal_utxo: &Utxo,
    protocol_params_utxo: &Utxo,
    proposal_script_ref: &Utxo,
    proposed_params: ProtocolParamsDatum,
    in_effect_at: u64,
) -> Result<TxBuilder, ActionError> {
    let params: ProtocolParamsDatum = inline_datum(protocol_params_utxo)?;
    // The current datum is decoded only to check the UTxO is a proposal.
    let _: ProtocolProposalDatum = inline_datum(proposal_utxo)?;
    let governor = governor_key_hash(&params)?;
    reference_script(proposal_script_ref, ScriptKind::Validator)?;
    let deadline = in_effect_at
        .checked_sub(params.proposal_waiting_period)
        .ok_or_else(|| {
            ActionError::InvalidAmount(format!(
                "in_effect_at {} is within the waiting period of {} ms",
                in_effect_at, params.proposal_waiting_period
            ))
        })?;

    debug!(
        governor = %governor,
        base = %protocol_params_utxo.out_ref,
        in_effect_at,
        "building propose_protocol_proposal"
    );

    let proposal = ProposedParams {
        in_effect_at,
        base: protocol_params_utxo.out_ref,
        params: proposed_params,
    };

    Ok(ctx
        .new_tx()
        .read_from([protocol_params_utxo.clone(), proposal_script_ref.clone()])
        .collect_from(
            [proposal_utxo.clone()],
            Some(encode(&ProtocolProposalRedeemer::Propose)),
        )
        .pay_to_output(reemit(proposal_utxo, Some(proposal)))
        .add_signer_key(governor)
        .valid_to(deadline))
}

// ---------------------------------------------------------------------------
// Apply
// ---------------------------------------------------------------------------

/// Replaces the protocol params with the pending proposal.
///
/// `protocol_script_ref_utxos` holds the params validator and the proposal
/// validator, in either order; they are the transaction's only reference
/// inputs. No signature is required: the validators check the proposal's
/// base and the validity interval.
///
/// # Errors
///
/// - [`ActionError::InvalidReferenceScript`] if either script UTxO carries
///   no spending validator.
/// - [`ActionError::MissingDatum`] / [`ActionError::Codec`] on a bad
///   proposal datum.
/// - [`ActionError::NoPendingProposal`] if nothing is proposed.
/// - [`ActionError::ProposalMismatch`] if the proposal was made against a
///   different params UTxO.
pub fn apply_protocol_proposal(
    ctx: &ProtocolContext,
    protocol_params_utxo: &Utxo,
    protocol_proposal_utxo: &Utxo,
    protocol_script_ref_utxos: [Utxo; 2],
) -> Result<TxBuilder, ActionError> {
    for utxo in &protocol_script_ref_utxos {
        reference_script(utxo, ScriptKind::Validator)?;
    }
    let ProtocolProposalDatum { proposal } = inline_datum(protocol_proposal_utxo)?;
    let proposal = proposal.ok_or(ActionError::NoPendingProposal(protocol_proposal_utxo.out_ref))?;
    if proposal.base != protocol_params_utxo.out_ref {
        return Err(ActionError::ProposalMismatch {
            expected: proposal.base,
            found: protocol_params_utxo.out_ref,
        });
    }

    debug!(
        base = %proposal.base,
        in_effect_at = proposal.in_effect_at,
        "building apply_protocol_proposal"
    );

    let new_params = TxOutput::new(
        protocol_params_utxo.address,
        protocol_params_utxo.value.clone(),
    )
    .with_inline_datum(encode(&proposal.params));

    Ok(ctx
        .new_tx()
        .read_from(protocol_script_ref_utxos)
        .collect_from(
            [protocol_params_utxo.clone()],
            Some(encode(&ProtocolParamsRedeemer::ApplyProposal)),
        )
        .collect_from(
            [protocol_proposal_utxo.clone()],
            Some(encode(&ProtocolProposalRedeemer::Apply)),
        )
        .pay_to_output(new_params)
        .pay_to_output(reemit(protocol_proposal_utxo, None))
        .valid_from(proposal.in_effect_at))
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

/// Clears the pending proposal under the governor's signature.
///
/// # Errors
///
/// As [`propose_protocol_proposal`], plus [`ActionError::NoPendingProposal`]
/// if there is nothing to cancel.
pub fn cancel_protocol_proposal(
    ctx: &ProtocolContext,
    proposal_utxo: &Utxo,
    protocol_params_utxo: &Utxo,
    proposal_script_ref: &Utxo,
) -> Result<TxBuilder, ActionError> {
    let params: ProtocolParamsDatum = inline_datum(protocol_params_utxo)?;
    let governor = governor_key_hash(&params)?;
    reference_script(proposal_script_ref, ScriptKind::Validator)?;
    let current: ProtocolProposalDatum = inline_datum(proposal_utxo)?;
    if current.proposal.is_none() {
        return Err(ActionError::NoPendingProposal(proposal_utxo.out_ref));
    }

    debug!(governor = %governor, "building cancel_protocol_proposal");

    Ok(ctx
        .new_tx()
        .read_from([protocol_params_utxo.clone(), proposal_script_ref.clone()])
        .collect_from(
            [proposal_utxo.clone()],
            Some(encode(&ProtocolProposalRedeemer::Cancel)),
        )
        .pay_to_output(reemit(proposal_utxo, None))
        .add_signer_key(governor))
}
