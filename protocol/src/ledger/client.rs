//! The seam between transaction construction and a live ledger.
//!
//! Construction code never talks to the network. Drivers hold a
//! [`LedgerClient`] handle, resolve references through it, hand the
//! resolved UTxOs to an action, and pass the resulting builder back for
//! finalization and submission.

use async_trait::async_trait;
use thiserror::Error;

use super::utxo::{OutRef, Utxo};
use crate::config::LedgerParams;
use crate::crypto::hash::{KeyHash, TxHash};
use crate::transaction::{Transaction, TxBuildError, TxBuilder};

/// Errors surfaced by a ledger client.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A reference or transaction the caller asked for does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A transaction spends (or reads) an output that is already spent.
    #[error("input already spent: {0}")]
    InputAlreadySpent(OutRef),

    /// A required key has not signed the transaction.
    #[error("missing signature from {0}")]
    MissingSignature(KeyHash),

    /// The ledger refused the transaction for a reason other than the above.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("failed to build transaction: {0}")]
    Build(#[from] TxBuildError),

    /// Loading or saving ledger state failed.
    #[error("ledger state error: {0}")]
    State(String),
}

/// Access to a ledger: UTxO lookup, finalization, signing, submission.
///
/// Implementations must be shareable across tasks. Only the lookup and
/// submission paths suspend; building is synchronous.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Parameters `finalize` balances against.
    fn params(&self) -> LedgerParams;

    /// Resolves `refs`. References the ledger does not know are skipped,
    /// so the result may be shorter than the request.
    async fn resolve_utxos(&self, refs: &[OutRef]) -> Result<Vec<Utxo>, LedgerError>;

    /// Resolves a single reference.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] if the ledger does not hold `out_ref`.
    async fn resolve_utxo(&self, out_ref: &OutRef) -> Result<Utxo, LedgerError> {
        self.resolve_utxos(std::slice::from_ref(out_ref))
            .await?
            .into_iter()
            .find(|u| u.out_ref == *out_ref)
            .ok_or_else(|| LedgerError::NotFound(out_ref.to_string()))
    }

    fn new_tx_builder(&self) -> TxBuilder {
        TxBuilder::new()
    }

    /// Completes `builder` against [`LedgerClient::params`].
    async fn finalize(&self, builder: TxBuilder) -> Result<Transaction, LedgerError> {
        Ok(builder.complete(&self.params())?)
    }

    /// Signs with the keys this client holds and submits. Returns the id.
    async fn sign_and_submit(&self, tx: Transaction) -> Result<TxHash, LedgerError>;

    /// Resolves once `tx_hash` is on the ledger.
    async fn await_confirmation(&self, tx_hash: &TxHash) -> Result<(), LedgerError>;
}
