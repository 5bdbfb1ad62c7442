//! Backing a project: locking lovelace at the backing validator.

use tracing::debug;

use teiki_protocol::data::encode;
use teiki_protocol::ledger::{Address, Utxo, Value};
use teiki_protocol::transaction::TxBuilder;

use crate::context::ProtocolContext;
use crate::datums::BackingDatum;
use crate::error::ActionError;

/// Spends `wallet_inputs` and locks `lovelace_amount` at `script_address`
/// with `datum` inline.
///
/// Whether the inputs cover the amount plus fee is not checked here; a
/// shortfall surfaces when the builder completes, as
/// `TxBuildError::UnbalancedTransaction`.
///
/// # Errors
///
/// - [`ActionError::InvalidAmount`] for a zero amount.
/// - [`ActionError::UnsupportedAddressForm`] if `script_address` is locked by
///   a key rather than the backing validator.
pub fn create_backing(
    ctx: &ProtocolContext,
    datum: &BackingDatum,
    lovelace_amount: u64,
    script_address: Address,
    wallet_inputs: Vec<Utxo>,
) -> Result<TxBuilder, ActionError> {
    if lovelace_amount == 0 {
        return Err(ActionError::InvalidAmount(
            "backing amount must be positive".to_string(),
        ));
    }
    if !script_address.is_script() {
        return Err(ActionError::UnsupportedAddressForm(format!(
            "backing address {} is not script-locked",
            script_address
        )));
    }

    debug!(
        project_id = %datum.project_id,
        amount = lovelace_amount,
        inputs = wallet_inputs.len(),
        "building create_backing"
    );

    Ok(ctx
        .new_tx()
        .collect_from(wallet_inputs, None)
        .pay_to_address_with_datum(
            script_address,
            Value::lovelace(lovelace_amount),
            encode(datum),
        ))
}
