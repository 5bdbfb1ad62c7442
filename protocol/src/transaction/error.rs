//! Errors from finalizing a transaction description.

use thiserror::Error;

use crate::ledger::Unit;

/// Errors returned by [`super::TxBuilder::complete`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxBuildError {
    /// Inputs plus positive mints do not cover outputs, burns and the fee
    /// for some unit.
    #[error("unbalanced transaction: {unit} requires {required}, only {available} available")]
    UnbalancedTransaction {
        unit: Unit,
        required: u64,
        available: u64,
    },

    /// A script-locked input or a minting policy has no script or no
    /// redeemer to satisfy it.
    #[error("missing witness for {purpose}: {reason}")]
    MissingWitness { purpose: String, reason: String },

    /// Summing values overflowed a 64-bit quantity.
    #[error("value overflow while summing {0}")]
    ValueOverflow(String),

    /// Leftover value needs a change output, but no change address was set
    /// and no key-locked input exists to fall back on.
    #[error("no change address for leftover value")]
    NoChangeAddress,

    /// A redeemer names an input or minting policy the body does not have.
    #[error("redeemer for {0} has no matching input or policy in the body")]
    UnboundRedeemer(String),

    /// The fee did not settle within the iteration limit.
    #[error("fee did not converge after {0} iterations")]
    FeeNotConverged(usize),
}
