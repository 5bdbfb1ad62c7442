//! Transaction construction via the builder pattern.
//!
//! [`TxBuilder`] accumulates a transaction description without doing any
//! network or cryptographic work. Everything expensive happens in
//! [`TxBuilder::complete`], which resolves script witnesses, settles the fee,
//! balances the value and returns a [`Transaction`] with a deterministic id.
//!
//! The builder never signs. Signing belongs to the ledger client, which keeps
//! construction testable without key material.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::body::{Redeemer, RedeemerPurpose, Transaction, TxBody};
use super::error::TxBuildError;
use crate::config::{LedgerParams, MAX_BALANCE_ITERATIONS, VKEY_WITNESS_SIZE_ESTIMATE};
use crate::crypto::hash::{KeyHash, ScriptHash};
use crate::data::PlutusData;
use crate::ledger::{Address, AssetUnit, Credential, OutRef, Script, TxOutput, Unit, Utxo, Value};

// ---------------------------------------------------------------------------
// TxBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for transaction descriptions.
///
/// # Usage
///
/// ```rust,ignore
/// let tx = TxBuilder::new()
///     .collect_from(wallet_utxos, None)
///     .pay_to_address_with_datum(script_address, Value::lovelace(5_000_000), datum)
///     .change_address(wallet_address)
///     .complete(&LedgerParams::default())?;
/// ```
///
/// Spending the same reference twice keeps the last redeemer given for it.
/// Minting deltas for the same unit accumulate, and a unit whose deltas
/// cancel out disappears from the description along with its redeemer.
#[derive(Debug, Clone, Default)]
pub struct TxBuilder {
    inputs: BTreeMap<OutRef, (Utxo, Option<PlutusData>)>,
    reference_inputs: BTreeMap<OutRef, Utxo>,
    outputs: Vec<TxOutput>,
    mint: BTreeMap<AssetUnit, i64>,
    mint_redeemers: BTreeMap<ScriptHash, PlutusData>,
    signers: BTreeSet<KeyHash>,
    valid_from: Option<u64>,
    valid_to: Option<u64>,
    scripts: Vec<Script>,
    change_address: Option<Address>,
}

impl TxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spends `utxos`. Script-locked inputs need `redeemer`; for key-locked
    /// inputs it is ignored at completion.
    pub fn collect_from(
        mut self,
        utxos: impl IntoIterator<Item = Utxo>,
        redeemer: Option<PlutusData>,
    ) -> Self {
        for utxo in utxos {
            self.inputs.insert(utxo.out_ref, (utxo, redeemer.clone()));
        }
        self
    }

    /// Adds read-only reference inputs.
    pub fn read_from(mut self, utxos: impl IntoIterator<Item = Utxo>) -> Self {
        for utxo in utxos {
            self.reference_inputs.insert(utxo.out_ref, utxo);
        }
        self
    }

    pub fn pay_to_address(mut self, address: Address, value: Value) -> Self {
        self.outputs.push(TxOutput::new(address, value));
        self
    }

    /// Pays to `address` with `datum` stored inline.
    pub fn pay_to_address_with_datum(
        mut self,
        address: Address,
        value: Value,
        datum: PlutusData,
    ) -> Self {
        self.outputs.push(TxOutput::new(address, value).with_inline_datum(datum));
        self
    }

    /// Adds an arbitrary output, e.g. one carrying a reference script.
    pub fn pay_to_output(mut self, output: TxOutput) -> Self {
        self.outputs.push(output);
        self
    }

    /// Adds signed minting deltas. `redeemer` is attached to every policy
    /// touched by `deltas`.
    pub fn mint_assets(
        mut self,
        deltas: impl IntoIterator<Item = (AssetUnit, i64)>,
        redeemer: PlutusData,
    ) -> Self {
        for (unit, quantity) in deltas {
            self.mint_redeemers.insert(unit.policy_id, redeemer.clone());
            let entry = self.mint.entry(unit.clone()).or_insert(0);
            *entry = entry.saturating_add(quantity);
            if *entry == 0 {
                self.mint.remove(&unit);
            }
        }
        self
    }

    pub fn add_signer_key(mut self, key_hash: KeyHash) -> Self {
        self.signers.insert(key_hash);
        self
    }

    /// Lower validity bound in POSIX milliseconds.
    pub fn valid_from(mut self, posix_ms: u64) -> Self {
        self.valid_from = Some(posix_ms);
        self
    }

    /// Upper validity bound in POSIX milliseconds.
    pub fn valid_to(mut self, posix_ms: u64) -> Self {
        self.valid_to = Some(posix_ms);
        self
    }

    /// Attaches a script to the witness set.
    pub fn attach_script(mut self, script: Script) -> Self {
        if !self.scripts.contains(&script) {
            self.scripts.push(script);
        }
        self
    }

    pub fn change_address(mut self, address: Address) -> Self {
        self.change_address = Some(address);
        self
    }

    // -- Accessors ----------------------------------------------------------

    pub fn inputs(&self) -> impl Iterator<Item = &Utxo> {
        self.inputs.values().map(|(utxo, _)| utxo)
    }

    /// Redeemer given for the spent input `out_ref`.
    pub fn spend_redeemer(&self, out_ref: &OutRef) -> Option<&PlutusData> {
        self.inputs.get(out_ref).and_then(|(_, r)| r.as_ref())
    }

    pub fn reference_inputs(&self) -> impl Iterator<Item = &Utxo> {
        self.reference_inputs.values()
    }

    pub fn outputs(&self) -> &[TxOutput] {
        &self.outputs
    }

    /// Net minting deltas, never containing zero.
    pub fn mint(&self) -> &BTreeMap<AssetUnit, i64> {
        &self.mint
    }

    /// Redeemer for minting policy `policy`, if it still mints or burns.
    pub fn mint_redeemer(&self, policy: &ScriptHash) -> Option<&PlutusData> {
        if self.mint.keys().any(|u| u.policy_id == *policy) {
            self.mint_redeemers.get(policy)
        } else {
            None
        }
    }

    pub fn signers(&self) -> &BTreeSet<KeyHash> {
        &self.signers
    }

    pub fn validity(&self) -> (Option<u64>, Option<u64>) {
        (self.valid_from, self.valid_to)
    }

    pub fn scripts(&self) -> &[Script] {
        &self.scripts
    }

    // -- Completion ---------------------------------------------------------

    /// Finalizes the description into a [`Transaction`].
    ///
    /// 1. Every script-locked input and every minting policy must have its
    ///    script available (attached, or on a spent or reference input) and
    ///    a redeemer.
    /// 2. The fee is `min_fee_a * size + min_fee_b + redeemers *
    ///    script_fee_per_redeemer`, iterated until the body it is written
    ///    into no longer grows it.
    /// 3. Leftover value goes to the change address. Lovelace-only leftovers
    ///    below `min_change_lovelace` are added to the fee instead.
    ///
    /// # Errors
    ///
    /// See [`TxBuildError`]. Nothing is retried.
    pub fn complete(self, params: &LedgerParams) -> Result<Transaction, TxBuildError> {
        let redeemers = self.resolve_witnesses()?;
        let available = self.available_value()?;
        let required = self.required_value()?;
        let change_address = self.change_address.or_else(|| {
            self.inputs()
                .find(|u| !u.address.is_script())
                .map(|u| u.address)
        });
        let witness_count = self.witness_count() as u64;

        let mut base_fee = 0u64;
        for _ in 0..MAX_BALANCE_ITERATIONS {
            let body =
                self.balanced_body(&available, &required, base_fee, change_address, params)?;
            let tx = Transaction::assemble(body, redeemers.clone(), self.scripts.clone())?;
            let size = tx.body.to_cbor().len() as u64
                + witness_count.saturating_mul(VKEY_WITNESS_SIZE_ESTIMATE);
            let fee = params
                .min_fee_a
                .saturating_mul(size)
                .saturating_add(params.min_fee_b)
                .saturating_add(
                    params
                        .script_fee_per_redeemer
                        .saturating_mul(redeemers.len() as u64),
                );
            if fee <= base_fee {
                debug!(
                    tx_id = %tx.id,
                    fee = tx.fee(),
                    size,
                    inputs = tx.body.inputs.len(),
                    outputs = tx.body.outputs.len(),
                    "transaction completed"
                );
                return Ok(tx);
            }
            base_fee = fee;
        }
        Err(TxBuildError::FeeNotConverged(MAX_BALANCE_ITERATIONS))
    }

    /// Redeemers for every script that runs, or the first missing witness.
    fn resolve_witnesses(&self) -> Result<Vec<Redeemer>, TxBuildError> {
        let available: BTreeSet<ScriptHash> = self
            .scripts
            .iter()
            .chain(self.reference_inputs().filter_map(|u| u.script_ref.as_ref()))
            .chain(self.inputs().filter_map(|u| u.script_ref.as_ref()))
            .map(Script::hash)
            .collect();

        let mut redeemers = Vec::new();
        for (out_ref, (utxo, redeemer)) in &self.inputs {
            let Credential::Script(hash) = utxo.address.payment else {
                continue;
            };
            let purpose = format!("spending {}", out_ref);
            if !available.contains(&hash) {
                return Err(missing(purpose, format!("validator {} not provided", hash)));
            }
            let data = redeemer
                .clone()
                .ok_or_else(|| missing(purpose, "no redeemer".to_string()))?;
            redeemers.push(Redeemer {
                purpose: RedeemerPurpose::Spend(*out_ref),
                data,
            });
        }

        let policies: BTreeSet<ScriptHash> = self.mint.keys().map(|u| u.policy_id).collect();
        for policy in policies {
            let purpose = format!("minting under {}", policy);
            if !available.contains(&policy) {
                return Err(missing(purpose, "minting policy not provided".to_string()));
            }
            let data = self
                .mint_redeemers
                .get(&policy)
                .cloned()
                .ok_or_else(|| missing(purpose, "no redeemer".to_string()))?;
            redeemers.push(Redeemer {
                purpose: RedeemerPurpose::Mint(policy),
                data,
            });
        }
        Ok(redeemers)
    }

    /// Inputs plus positive mints.
    fn available_value(&self) -> Result<Value, TxBuildError> {
        let minted: Value = self
            .mint
            .iter()
            .filter(|(_, q)| **q > 0)
            .map(|(u, q)| (Unit::Asset(u.clone()), q.unsigned_abs()))
            .collect();
        self.inputs()
            .try_fold(minted, |acc, u| acc.checked_add(&u.value))
            .ok_or_else(|| TxBuildError::ValueOverflow("inputs".to_string()))
    }

    /// Outputs plus burns.
    fn required_value(&self) -> Result<Value, TxBuildError> {
        let burned: Value = self
            .mint
            .iter()
            .filter(|(_, q)| **q < 0)
            .map(|(u, q)| (Unit::Asset(u.clone()), q.unsigned_abs()))
            .collect();
        self.outputs
            .iter()
            .try_fold(burned, |acc, o| acc.checked_add(&o.value))
            .ok_or_else(|| TxBuildError::ValueOverflow("outputs".to_string()))
    }

    /// Distinct keys expected to sign: required signers plus the owners of
    /// key-locked inputs.
    fn witness_count(&self) -> usize {
        let mut keys = self.signers.clone();
        keys.extend(self.inputs().filter_map(|u| match u.address.payment {
            Credential::Key(h) => Some(h),
            Credential::Script(_) => None,
        }));
        keys.len()
    }

    fn balanced_body(
        &self,
        available: &Value,
        required: &Value,
        base_fee: u64,
        change_address: Option<Address>,
        params: &LedgerParams,
    ) -> Result<TxBody, TxBuildError> {
        let needed = required
            .checked_add(&Value::lovelace(base_fee))
            .ok_or_else(|| TxBuildError::ValueOverflow("fee".to_string()))?;
        let leftover = available.checked_sub(&needed).map_err(|(unit, required, available)| {
            TxBuildError::UnbalancedTransaction {
                unit,
                required,
                available,
            }
        })?;

        let mut outputs = self.outputs.clone();
        let mut fee = base_fee;
        if leftover.has_assets() || leftover.lovelace_amount() >= params.min_change_lovelace {
            let address = change_address.ok_or(TxBuildError::NoChangeAddress)?;
            outputs.push(TxOutput::new(address, leftover));
        } else {
            fee = fee.saturating_add(leftover.lovelace_amount());
        }

        Ok(TxBody {
            inputs: self.inputs.keys().copied().collect(),
            reference_inputs: self.reference_inputs.keys().copied().collect(),
            outputs,
            fee,
            mint: self.mint.clone(),
            required_signers: self.signers.iter().copied().collect(),
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            script_data_hash: None,
        })
    }
}

fn missing(purpose: String, reason: String) -> TxBuildError {
    TxBuildError::MissingWitness { purpose, reason }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NETWORK_ID_TESTNET;
    use crate::crypto::hash::{blake2b_224, blake2b_256};
    use crate::ledger::{resolve_unit, AssetName};

    /// Flat fee of 1000, no size or script component, 500 minimum change.
    fn flat_params() -> LedgerParams {
        LedgerParams {
            network_id: NETWORK_ID_TESTNET,
            min_fee_a: 0,
            min_fee_b: 1_000,
            script_fee_per_redeemer: 0,
            min_change_lovelace: 500,
        }
    }

    fn wallet() -> Address {
        Address::from_key_hash(NETWORK_ID_TESTNET, blake2b_224(b"wallet"))
    }

    fn utxo(seed: &[u8], address: Address, value: Value) -> Utxo {
        Utxo::from_output(OutRef::new(blake2b_256(seed), 0), TxOutput::new(address, value))
    }

    fn policy() -> Script {
        Script::minting_policy(vec![0x4d, 0x01, 0x00])
    }

    fn teiki(policy: &Script) -> AssetUnit {
        resolve_unit(&policy.hash(), &AssetName::new(b"teiki".to_vec()).unwrap())
    }

    #[test]
    fn test_change_goes_to_change_address() {
        let tx = TxBuilder::new()
            .collect_from([utxo(b"a", wallet(), Value::lovelace(10_000))], None)
            .pay_to_address(wallet(), Value::lovelace(4_000))
            .complete(&flat_params())
            .unwrap();

        assert_eq!(tx.fee(), 1_000);
        assert_eq!(tx.body.outputs.len(), 2);
        assert_eq!(tx.body.outputs[1].value, Value::lovelace(5_000));
        assert_eq!(tx.body.outputs[1].address, wallet());
    }

    #[test]
    fn test_dust_change_is_absorbed_into_fee() {
        let tx = TxBuilder::new()
            .collect_from([utxo(b"a", wallet(), Value::lovelace(10_000))], None)
            .pay_to_address(wallet(), Value::lovelace(8_700))
            .complete(&flat_params())
            .unwrap();

        assert_eq!(tx.fee(), 1_300);
        assert_eq!(tx.body.outputs.len(), 1);
    }

    #[test]
    fn test_shortfall_is_unbalanced() {
        let err = TxBuilder::new()
            .collect_from([utxo(b"a", wallet(), Value::lovelace(1_000))], None)
            .pay_to_address(wallet(), Value::lovelace(5_000))
            .complete(&flat_params())
            .unwrap_err();

        assert_eq!(
            err,
            TxBuildError::UnbalancedTransaction {
                unit: Unit::Lovelace,
                required: 5_000,
                available: 1_000,
            }
        );
    }

    #[test]
    fn test_fee_shortfall_is_unbalanced() {
        // Covers the payment but not the fee on top of it.
        let err = TxBuilder::new()
            .collect_from([utxo(b"a", wallet(), Value::lovelace(5_500))], None)
            .pay_to_address(wallet(), Value::lovelace(5_000))
            .complete(&flat_params())
            .unwrap_err();

        assert!(matches!(
            err,
            TxBuildError::UnbalancedTransaction { required: 6_000, available: 5_500, .. }
        ));
    }

    #[test]
    fn test_size_fee_reaches_fixed_point() {
        let params = LedgerParams {
            min_fee_a: 44,
            min_fee_b: 155_381,
            ..flat_params()
        };
        let tx = TxBuilder::new()
            .collect_from([utxo(b"a", wallet(), Value::lovelace(10_000_000))], None)
            .pay_to_address(wallet(), Value::lovelace(2_000_000))
            .complete(&params)
            .unwrap();

        let size = tx.body.to_cbor().len() as u64 + VKEY_WITNESS_SIZE_ESTIMATE;
        assert!(tx.fee() >= 44 * size + 155_381);
        let out: u64 = tx.body.outputs.iter().map(|o| o.value.lovelace_amount()).sum();
        assert_eq!(out + tx.fee(), 10_000_000);
    }

    #[test]
    fn test_script_input_needs_script_and_redeemer() {
        let validator = Script::validator(vec![1, 2, 3]);
        let locked = Address::from_script_hash(NETWORK_ID_TESTNET, validator.hash());
        let input = utxo(b"s", locked, Value::lovelace(10_000));

        let err = TxBuilder::new()
            .collect_from([input.clone()], Some(PlutusData::void()))
            .change_address(wallet())
            .complete(&flat_params())
            .unwrap_err();
        assert!(matches!(err, TxBuildError::MissingWitness { .. }));

        let err = TxBuilder::new()
            .collect_from([input.clone()], None)
            .attach_script(validator.clone())
            .change_address(wallet())
            .complete(&flat_params())
            .unwrap_err();
        assert!(matches!(err, TxBuildError::MissingWitness { .. }));

        let script_ref = Utxo::from_output(
            OutRef::new(blake2b_256(b"ref"), 0),
            TxOutput::new(wallet(), Value::lovelace(1)).with_script_ref(validator),
        );
        let tx = TxBuilder::new()
            .collect_from([input.clone()], Some(PlutusData::void()))
            .read_from([script_ref])
            .change_address(wallet())
            .complete(&flat_params())
            .unwrap();
        assert_eq!(
            tx.redeemer(&RedeemerPurpose::Spend(input.out_ref)),
            Some(&PlutusData::void())
        );
        assert!(tx.body.script_data_hash.is_some());
    }

    #[test]
    fn test_mint_requires_policy() {
        let policy = policy();
        let unit = teiki(&policy);
        let base = TxBuilder::new()
            .collect_from([utxo(b"a", wallet(), Value::lovelace(10_000))], None)
            .mint_assets([(unit.clone(), 10)], PlutusData::constr(0, vec![]));

        let err = base.clone().complete(&flat_params()).unwrap_err();
        assert!(matches!(err, TxBuildError::MissingWitness { .. }));

        let tx = base.attach_script(policy.clone()).complete(&flat_params()).unwrap();
        assert_eq!(tx.minted(&unit), 10);
        // Minted tokens land in the change output.
        let change = tx.body.outputs.last().unwrap();
        assert_eq!(change.value.get(&Unit::Asset(unit)), 10);
        assert!(tx.redeemer(&RedeemerPurpose::Mint(policy.hash())).is_some());
    }

    #[test]
    fn test_burn_consumes_input_tokens() {
        let policy = policy();
        let unit = teiki(&policy);
        let holding = Value::lovelace(10_000).with(Unit::Asset(unit.clone()), 100);

        let tx = TxBuilder::new()
            .collect_from([utxo(b"a", wallet(), holding)], None)
            .attach_script(policy.clone())
            .mint_assets([(unit.clone(), -100)], PlutusData::constr(1, vec![]))
            .complete(&flat_params())
            .unwrap();
        assert_eq!(tx.minted(&unit), -100);
        assert!(tx.body.outputs.iter().all(|o| !o.value.has_assets()));

        let err = TxBuilder::new()
            .collect_from([utxo(b"b", wallet(), Value::lovelace(10_000))], None)
            .attach_script(policy)
            .mint_assets([(unit.clone(), -100)], PlutusData::constr(1, vec![]))
            .complete(&flat_params())
            .unwrap_err();
        assert_eq!(
            err,
            TxBuildError::UnbalancedTransaction {
                unit: Unit::Asset(unit),
                required: 100,
                available: 0,
            }
        );
    }

    #[test]
    fn test_cancelling_deltas_drop_the_mint() {
        let unit = teiki(&policy());
        let builder = TxBuilder::new()
            .mint_assets([(unit.clone(), 5)], PlutusData::void())
            .mint_assets([(unit.clone(), -5)], PlutusData::void());
        assert!(builder.mint().is_empty());
        assert!(builder.mint_redeemer(&unit.policy_id).is_none());
    }

    #[test]
    fn test_id_ignores_collection_order() {
        let a = utxo(b"a", wallet(), Value::lovelace(6_000));
        let b = utxo(b"b", wallet(), Value::lovelace(6_000));
        let one = TxBuilder::new()
            .collect_from([a.clone(), b.clone()], None)
            .pay_to_address(wallet(), Value::lovelace(1_000))
            .complete(&flat_params())
            .unwrap();
        let two = TxBuilder::new()
            .collect_from([b], None)
            .collect_from([a], None)
            .pay_to_address(wallet(), Value::lovelace(1_000))
            .complete(&flat_params())
            .unwrap();
        assert_eq!(one.id, two.id);
    }

    #[test]
    fn test_leftover_without_change_address() {
        let validator = Script::validator(vec![9]);
        let locked = Address::from_script_hash(NETWORK_ID_TESTNET, validator.hash());
        let err = TxBuilder::new()
            .collect_from([utxo(b"s", locked, Value::lovelace(10_000))], Some(PlutusData::void()))
            .attach_script(validator)
            .complete(&flat_params())
            .unwrap_err();
        assert_eq!(err, TxBuildError::NoChangeAddress);
    }

    #[test]
    fn test_signers_and_validity_reach_the_body() {
        let key = blake2b_224(b"governor");
        let tx = TxBuilder::new()
            .collect_from([utxo(b"a", wallet(), Value::lovelace(10_000))], None)
            .add_signer_key(key)
            .valid_from(1_700_000_000_000)
            .valid_to(1_700_000_600_000)
            .complete(&flat_params())
            .unwrap();
        assert_eq!(tx.body.required_signers, vec![key]);
        assert_eq!(tx.body.valid_from, Some(1_700_000_000_000));
        assert_eq!(tx.body.valid_to, Some(1_700_000_600_000));
    }

    #[test]
    fn test_zero_asset_entry_from_json_is_still_dust() {
        let unit = teiki(&policy());
        let json = format!(r#"{{"lovelace":10000,"{}":0}}"#, unit);
        let value: Value = serde_json::from_str(&json).unwrap();
        let tx = TxBuilder::new()
            .collect_from([utxo(b"a", wallet(), value)], None)
            .pay_to_address(wallet(), Value::lovelace(8_700))
            .complete(&flat_params())
            .unwrap();

        assert_eq!(tx.fee(), 1_300);
        assert_eq!(tx.body.outputs.len(), 1);
    }
}
