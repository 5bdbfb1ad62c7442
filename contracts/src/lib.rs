// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Teiki Governance Contracts
//!
//! Off-chain side of the Teiki protocol validators: the datums they read,
//! the redeemers that select their branches, and one action per governance
//! operation that assembles a transaction those validators accept.
//!
//! - **Backing**: lock lovelace behind a project at the backing validator.
//! - **Teiki**: burn or evolve the protocol token under its minting policy.
//! - **Protocol script**: reclaim UTxOs held by the protocol script.
//! - **Proposals**: propose, apply and cancel protocol parameter changes.
//!
//! ## Design Principles
//!
//! 1. Actions are pure. They take resolved UTxOs and return a
//!    [`teiki_protocol::TxBuilder`]; resolving, finalizing and submitting
//!    belong to the caller's [`teiki_protocol::LedgerClient`].
//! 2. Every datum is decoded through its schema before use, so a UTxO with
//!    the wrong shape fails with [`ActionError::Codec`] rather than a
//!    malformed transaction.
//! 3. Redeemers are closed enums. Adding a branch is a compile error at
//!    every encode site.

pub mod actions;
pub mod context;
pub mod datums;
pub mod error;
pub mod redeemers;

pub use actions::{
    apply_protocol_proposal, burn_teiki, cancel_protocol_proposal, create_backing, evolve_teiki,
    propose_protocol_proposal, reclaim_protocol_script,
};
pub use context::ProtocolContext;
pub use datums::{BackingDatum, ProposedParams, ProtocolParamsDatum, ProtocolProposalDatum, Registry};
pub use error::ActionError;
pub use redeemers::{
    ProtocolParamsRedeemer, ProtocolProposalRedeemer, ProtocolScriptRedeemer, TeikiMintingRedeemer,
};
