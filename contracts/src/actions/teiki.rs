//! Burning and evolving Teiki.
//!
//! Both actions mint a negative delta of the Teiki unit under the policy
//! carried by a reference script. They differ only in the redeemer, which
//! selects the branch the minting policy validates.

use tracing::debug;

use teiki_protocol::data::encode;
use teiki_protocol::ledger::{ScriptKind, Utxo};
use teiki_protocol::transaction::TxBuilder;

use super::{burn_delta, reference_script};
use crate::context::ProtocolContext;
use crate::error::ActionError;
use crate::redeemers::TeikiMintingRedeemer;

/// Burns `burn_amount` Teiki under the policy attached to `ref_script_utxo`.
///
/// # Errors
///
/// - [`ActionError::InvalidReferenceScript`] if the UTxO carries no minting
///   policy.
/// - [`ActionError::InvalidAmount`] for zero or more than `i64::MAX`.
pub fn burn_teiki(
    ctx: &ProtocolContext,
    ref_script_utxo: &Utxo,
    burn_amount: u64,
) -> Result<TxBuilder, ActionError> {
    negative_mint(ctx, ref_script_utxo, burn_amount, TeikiMintingRedeemer::Burn)
}

/// Burns `total_amount` Teiki with the `Evolve` redeemer.
///
/// Only the burn leg is expressed. The policy's evolve branch may expect a
/// matching reissue in the same transaction; callers add it to the returned
/// builder if their deployment requires one.
pub fn evolve_teiki(
    ctx: &ProtocolContext,
    ref_script_utxo: &Utxo,
    total_amount: u64,
) -> Result<TxBuilder, ActionError> {
    negative_mint(ctx, ref_script_utxo, total_amount, TeikiMintingRedeemer::Evolve)
}

fn negative_mint(
    ctx: &ProtocolContext,
    ref_script_utxo: &Utxo,
    amount: u64,
    redeemer: TeikiMintingRedeemer,
) -> Result<TxBuilder, ActionError> {
    let policy = reference_script(ref_script_utxo, ScriptKind::MintingPolicy)?;
    let delta = burn_delta(amount)?;
    let unit = ctx.teiki_unit(policy);

    debug!(unit = %unit, delta, redeemer = ?redeemer, "building teiki mint");

    Ok(ctx
        .new_tx()
        .read_from([ref_script_utxo.clone()])
        .mint_assets([(unit, delta)], encode(&redeemer)))
}
