//! Errors raised while assembling a protocol action.

use teiki_protocol::data::CodecError;
use teiki_protocol::ledger::{OutRef, ScriptKind};
use thiserror::Error;

/// Errors that can occur before an action hands back its builder.
///
/// None of these are recoverable by retrying with the same inputs: each one
/// means a UTxO passed in does not look the way the protocol requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The UTxO carries no inline datum.
    #[error("utxo {0} has no inline datum")]
    MissingDatum(OutRef),

    /// The UTxO has no attached script of the expected kind.
    #[error("utxo {out_ref} does not carry a {expected} reference script")]
    InvalidReferenceScript {
        /// The offending reference.
        out_ref: OutRef,
        /// The script kind the action needed.
        expected: ScriptKind,
    },

    /// An address is not of the form the action requires, e.g. a governor
    /// locked by a script instead of a key.
    #[error("unsupported address form: {0}")]
    UnsupportedAddressForm(String),

    /// A quantity is zero or out of range.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The proposal UTxO holds no proposal.
    #[error("proposal utxo {0} has no pending proposal")]
    NoPendingProposal(OutRef),

    /// The pending proposal was made against different protocol params.
    #[error("proposal is based on {expected}, but params utxo is {found}")]
    ProposalMismatch {
        /// The `base` recorded in the proposal.
        expected: OutRef,
        /// The params UTxO supplied by the caller.
        found: OutRef,
    },

    /// A datum failed to decode.
    #[error("datum decoding failed: {0}")]
    Codec(#[from] CodecError),
}
