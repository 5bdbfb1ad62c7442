//! In-memory ledger.
//!
//! [`Emulator`] implements [`LedgerClient`] over a UTxO map guarded by a
//! `parking_lot::RwLock`. It checks what a ledger checks before touching
//! state (inputs exist and are unspent, required keys signed, validity
//! interval) and applies a transaction atomically under one write lock. It
//! does not run scripts.
//!
//! State round-trips through [`LedgerSnapshot`], a plain JSON document, so
//! a CLI session can pick up where the last one left off.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::address::{Address, Credential};
use super::client::{LedgerClient, LedgerError};
use super::utxo::{OutRef, Utxo};
use crate::config::LedgerParams;
use crate::crypto::hash::{KeyHash, TxHash};
use crate::crypto::keys::WalletKey;
use crate::transaction::Transaction;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Serializable ledger state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub params: LedgerParams,

    #[serde(default)]
    pub utxos: Vec<Utxo>,

    /// Outputs consumed by applied transactions.
    #[serde(default)]
    pub spent: Vec<OutRef>,

    /// Ids of applied transactions, in order.
    #[serde(default)]
    pub confirmed: Vec<TxHash>,

    /// Ledger clock in POSIX milliseconds. Validity intervals are only
    /// enforced when it is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_ms: Option<u64>,
}

impl LedgerSnapshot {
    pub fn from_json(json: &str) -> Result<Self, LedgerError> {
        serde_json::from_str(json).map_err(|e| LedgerError::State(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, LedgerError> {
        serde_json::to_string_pretty(self).map_err(|e| LedgerError::State(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Emulator
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct State {
    utxos: BTreeMap<OutRef, Utxo>,
    spent: BTreeSet<OutRef>,
    confirmed: Vec<TxHash>,
    time_ms: Option<u64>,
}

/// In-memory [`LedgerClient`].
pub struct Emulator {
    params: LedgerParams,
    keys: Vec<WalletKey>,
    state: RwLock<State>,
}

impl Emulator {
    /// Empty ledger that signs with `keys`.
    pub fn new(params: LedgerParams, keys: Vec<WalletKey>) -> Self {
        Self {
            params,
            keys,
            state: RwLock::new(State::default()),
        }
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot, keys: Vec<WalletKey>) -> Self {
        let state = State {
            utxos: snapshot
                .utxos
                .into_iter()
                .map(|u| (u.out_ref, u))
                .collect(),
            spent: snapshot.spent.into_iter().collect(),
            confirmed: snapshot.confirmed,
            time_ms: snapshot.time_ms,
        };
        Self {
            params: snapshot.params,
            keys,
            state: RwLock::new(state),
        }
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.state.read();
        LedgerSnapshot {
            params: self.params,
            utxos: state.utxos.values().cloned().collect(),
            spent: state.spent.iter().copied().collect(),
            confirmed: state.confirmed.clone(),
            time_ms: state.time_ms,
        }
    }

    /// Reads a JSON snapshot from `path`.
    pub fn load(path: &Path, keys: Vec<WalletKey>) -> Result<Self, LedgerError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::State(format!("{}: {}", path.display(), e)))?;
        let snapshot = LedgerSnapshot::from_json(&json)?;
        debug!(
            path = %path.display(),
            utxos = snapshot.utxos.len(),
            "ledger snapshot loaded"
        );
        Ok(Self::from_snapshot(snapshot, keys))
    }

    /// Writes the current state to `path` as JSON.
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let json = self.snapshot().to_json()?;
        std::fs::write(path, json)
            .map_err(|e| LedgerError::State(format!("{}: {}", path.display(), e)))
    }

    /// Seeds an output, as a genesis distribution would.
    pub fn add_utxo(&self, utxo: Utxo) {
        self.state.write().utxos.insert(utxo.out_ref, utxo);
    }

    pub fn set_time(&self, posix_ms: u64) {
        self.state.write().time_ms = Some(posix_ms);
    }

    /// Unspent outputs at `address`.
    pub fn utxos_at(&self, address: &Address) -> Vec<Utxo> {
        self.state
            .read()
            .utxos
            .values()
            .filter(|u| u.address == *address)
            .cloned()
            .collect()
    }

    pub fn is_spent(&self, out_ref: &OutRef) -> bool {
        self.state.read().spent.contains(out_ref)
    }

    /// Keys that must sign `tx`: required signers plus owners of key-locked
    /// inputs.
    fn required_keys(state: &State, tx: &Transaction) -> BTreeSet<KeyHash> {
        let mut keys: BTreeSet<KeyHash> = tx.body.required_signers.iter().copied().collect();
        for input in &tx.body.inputs {
            if let Some(Credential::Key(h)) = state.utxos.get(input).map(|u| u.address.payment) {
                keys.insert(h);
            }
        }
        keys
    }

    fn sign(&self, tx: &mut Transaction, keys: &BTreeSet<KeyHash>) {
        for key in &self.keys {
            if keys.contains(&key.key_hash()) {
                tx.add_signature(key.witness(tx.id.as_bytes()));
            }
        }
    }

    /// Validates and applies `tx` under a single write lock.
    fn apply(&self, mut tx: Transaction) -> Result<TxHash, LedgerError> {
        let mut state = self.state.write();

        for out_ref in tx.body.inputs.iter().chain(&tx.body.reference_inputs) {
            if state.spent.contains(out_ref) {
                return Err(LedgerError::InputAlreadySpent(*out_ref));
            }
            if !state.utxos.contains_key(out_ref) {
                return Err(LedgerError::NotFound(out_ref.to_string()));
            }
        }

        if let Some(now) = state.time_ms {
            if tx.body.valid_from.is_some_and(|from| now < from) {
                return Err(LedgerError::Rejected(format!(
                    "not valid before {}, ledger time is {}",
                    tx.body.valid_from.unwrap_or_default(),
                    now
                )));
            }
            if tx.body.valid_to.is_some_and(|to| now > to) {
                return Err(LedgerError::Rejected(format!(
                    "expired at {}, ledger time is {}",
                    tx.body.valid_to.unwrap_or_default(),
                    now
                )));
            }
        }

        let required = Self::required_keys(&state, &tx);
        self.sign(&mut tx, &required);
        if let Some(missing) = required.iter().find(|k| !tx.is_signed_by(k)) {
            return Err(LedgerError::MissingSignature(*missing));
        }

        for out_ref in &tx.body.inputs {
            state.utxos.remove(out_ref);
            state.spent.insert(*out_ref);
        }
        for (index, output) in tx.body.outputs.iter().enumerate() {
            let out_ref = OutRef::new(tx.id, index as u32);
            state
                .utxos
                .insert(out_ref, Utxo::from_output(out_ref, output.clone()));
        }
        state.confirmed.push(tx.id);

        info!(
            tx_id = %tx.id,
            inputs = tx.body.inputs.len(),
            outputs = tx.body.outputs.len(),
            fee = tx.fee(),
            "transaction applied"
        );
        Ok(tx.id)
    }
}

#[async_trait]
impl LedgerClient for Emulator {
    fn params(&self) -> LedgerParams {
        self.params
    }

    async fn resolve_utxos(&self, refs: &[OutRef]) -> Result<Vec<Utxo>, LedgerError> {
        let state = self.state.read();
        Ok(refs
            .iter()
            .filter_map(|r| state.utxos.get(r).cloned())
            .collect())
    }

    async fn sign_and_submit(&self, tx: Transaction) -> Result<TxHash, LedgerError> {
        self.apply(tx)
    }

    async fn await_confirmation(&self, tx_hash: &TxHash) -> Result<(), LedgerError> {
        if self.state.read().confirmed.contains(tx_hash) {
            Ok(())
        } else {
            Err(LedgerError::NotFound(tx_hash.to_string()))
        }
    }
}
