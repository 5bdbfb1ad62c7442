//! End-to-end tests for the construction core against the emulator.
//!
//! Each test seeds its own ledger, builds transactions through the public
//! API only, submits them, and inspects the resulting UTxO set.

use teiki_protocol::config::{LedgerParams, NETWORK_ID_TESTNET};
use teiki_protocol::crypto::hash::blake2b_256;
use teiki_protocol::crypto::keys::WalletKey;
use teiki_protocol::data::{from_cbor, to_cbor, PlutusData};
use teiki_protocol::ledger::{
    resolve_unit, Address, AssetName, Emulator, LedgerClient, LedgerError, OutRef, Script,
    TxOutput, Unit, Utxo, Value,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn params() -> LedgerParams {
    LedgerParams {
        network_id: NETWORK_ID_TESTNET,
        min_fee_a: 44,
        min_fee_b: 155_381,
        script_fee_per_redeemer: 350_000,
        min_change_lovelace: 1_000_000,
    }
}

/// Ledger holding 100 ADA for `key` at `genesis#0`.
fn setup(key: &WalletKey) -> (Emulator, Address) {
    let ledger = Emulator::new(params(), vec![key.clone()]);
    let wallet = Address::from_key_hash(NETWORK_ID_TESTNET, key.key_hash());
    ledger.add_utxo(Utxo::from_output(
        OutRef::new(blake2b_256(b"genesis"), 0),
        TxOutput::new(wallet, Value::lovelace(100_000_000)),
    ));
    (ledger, wallet)
}

fn wallet_utxos(ledger: &Emulator, wallet: &Address) -> Vec<Utxo> {
    ledger.utxos_at(wallet)
}

// ---------------------------------------------------------------------------
// Flows
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lock_then_unlock_with_reference_script() {
    let key = WalletKey::from_seed(&[11; 32]);
    let (ledger, wallet) = setup(&key);
    let validator = Script::validator(vec![0x4e, 0x01, 0x02, 0x03]);
    let locked_at = Address::from_script_hash(NETWORK_ID_TESTNET, validator.hash());

    // Lock funds with an inline datum and publish the validator as a
    // reference script in the same transaction.
    let datum = PlutusData::constr(0, vec![PlutusData::Integer(42)]);
    let tx = ledger
        .finalize(
            ledger
                .new_tx_builder()
                .collect_from(wallet_utxos(&ledger, &wallet), None)
                .pay_to_address_with_datum(locked_at, Value::lovelace(10_000_000), datum.clone())
                .pay_to_output(
                    TxOutput::new(wallet, Value::lovelace(5_000_000))
                        .with_script_ref(validator.clone()),
                ),
        )
        .await
        .unwrap();
    let lock_id = ledger.sign_and_submit(tx).await.unwrap();
    ledger.await_confirmation(&lock_id).await.unwrap();

    let locked = ledger.resolve_utxo(&OutRef::new(lock_id, 0)).await.unwrap();
    assert_eq!(locked.inline_datum(), Some(&datum));
    let script_ref = ledger.resolve_utxo(&OutRef::new(lock_id, 1)).await.unwrap();

    // Unlock: the validator comes from the reference input, the wallet pays
    // the fee through the change.
    let fee_input = ledger
        .resolve_utxo(&OutRef::new(lock_id, 2))
        .await
        .unwrap();
    let tx = ledger
        .finalize(
            ledger
                .new_tx_builder()
                .collect_from([locked.clone()], Some(PlutusData::void()))
                .collect_from([fee_input], None)
                .read_from([script_ref.clone()])
                .change_address(wallet),
        )
        .await
        .unwrap();
    assert!(tx.fee() >= 350_000 + 155_381);
    let unlock_id = ledger.sign_and_submit(tx).await.unwrap();

    assert!(ledger.is_spent(&locked.out_ref));
    assert!(!ledger.is_spent(&script_ref.out_ref));
    ledger.await_confirmation(&unlock_id).await.unwrap();
}

#[tokio::test]
async fn mint_then_burn_balances_to_zero() {
    let key = WalletKey::from_seed(&[12; 32]);
    let (ledger, wallet) = setup(&key);
    let policy = Script::minting_policy(vec![0x4e, 0x09]);
    let unit = resolve_unit(&policy.hash(), &AssetName::new(b"teiki".to_vec()).unwrap());

    let tx = ledger
        .finalize(
            ledger
                .new_tx_builder()
                .collect_from(wallet_utxos(&ledger, &wallet), None)
                .attach_script(policy.clone())
                .mint_assets([(unit.clone(), 250)], PlutusData::constr(0, vec![])),
        )
        .await
        .unwrap();
    ledger.sign_and_submit(tx).await.unwrap();

    let holding: u64 = wallet_utxos(&ledger, &wallet)
        .iter()
        .map(|u| u.value.get(&Unit::Asset(unit.clone())))
        .sum();
    assert_eq!(holding, 250);

    let tx = ledger
        .finalize(
            ledger
                .new_tx_builder()
                .collect_from(wallet_utxos(&ledger, &wallet), None)
                .attach_script(policy)
                .mint_assets([(unit.clone(), -250)], PlutusData::constr(1, vec![])),
        )
        .await
        .unwrap();
    ledger.sign_and_submit(tx).await.unwrap();

    assert!(wallet_utxos(&ledger, &wallet)
        .iter()
        .all(|u| !u.value.has_assets()));
}

#[tokio::test]
async fn overspending_surfaces_as_build_error() {
    let key = WalletKey::from_seed(&[13; 32]);
    let (ledger, wallet) = setup(&key);

    let err = ledger
        .finalize(
            ledger
                .new_tx_builder()
                .collect_from(wallet_utxos(&ledger, &wallet), None)
                .pay_to_address(wallet, Value::lovelace(500_000_000)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Build(_)));
}

#[test]
fn datum_bytes_survive_the_codec() {
    let datum = PlutusData::constr(
        3,
        vec![
            PlutusData::Bytes(vec![7; 100]),
            PlutusData::Map(vec![(PlutusData::Integer(-1), PlutusData::List(vec![]))]),
            PlutusData::Integer(i128::from(u64::MAX) * 4),
        ],
    );
    let bytes = to_cbor(&datum);
    assert_eq!(from_cbor::<PlutusData>(&bytes).unwrap(), datum);
}
