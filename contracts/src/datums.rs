//! # Protocol Datums
//!
//! Typed datums read and written by the governance actions. Field order and
//! constructor indices are part of the on-chain contract: every record here
//! is `Constr 0 [fields...]` in declaration order.

use teiki_protocol::crypto::hash::{Hash, ScriptHash};
use teiki_protocol::data::{CodecError, Field, Fields, PlutusData, PlutusType, Schema};
use teiki_protocol::ledger::{OutRef, PlutusAddress};

fn u64_field(name: &'static str) -> Field {
    Field::new(name, Schema::Integer)
}

fn script_hash_field(name: &'static str) -> Field {
    Field::new(name, ScriptHash::schema())
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Hashes of the validators the protocol currently trusts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registry {
    pub protocol_staking_validator: ScriptHash,
    pub project_validator: ScriptHash,
    pub backing_validator: ScriptHash,
    pub shared_treasury_validator: ScriptHash,
    pub open_treasury_validator: ScriptHash,
}

impl PlutusType for Registry {
    fn schema() -> Schema {
        Schema::record(
            "Registry",
            vec![
                script_hash_field("protocol_staking_validator"),
                script_hash_field("project_validator"),
                script_hash_field("backing_validator"),
                script_hash_field("shared_treasury_validator"),
                script_hash_field("open_treasury_validator"),
            ],
        )
    }

    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![
                self.protocol_staking_validator.to_plutus_data(),
                self.project_validator.to_plutus_data(),
                self.backing_validator.to_plutus_data(),
                self.shared_treasury_validator.to_plutus_data(),
                self.open_treasury_validator.to_plutus_data(),
            ],
        )
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        let mut f = Fields::of(data, "Registry", 0)?;
        Ok(Self {
            protocol_staking_validator: f.next()?,
            project_validator: f.next()?,
            backing_validator: f.next()?,
            shared_treasury_validator: f.next()?,
            open_treasury_validator: f.next()?,
        })
    }
}

// ---------------------------------------------------------------------------
// ProtocolParamsDatum
// ---------------------------------------------------------------------------

/// The protocol parameters, held inline at the protocol params UTxO.
///
/// Ratios are in units of 1/1_000_000. Durations are POSIX milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolParamsDatum {
    pub registry: Registry,
    /// Whoever holds the payment key of this address governs the protocol.
    pub governor_address: PlutusAddress,
    pub governor_share_ratio: u64,
    pub protocol_funds_share_ratio: u64,
    pub discount_cent_price: u64,
    /// Backing thresholds, in lovelace, at which a project reaches each
    /// milestone.
    pub project_milestones: Vec<u64>,
    pub teiki_coefficient: u64,
    pub project_teiki_burn_rate: u64,
    pub epoch_length: u64,
    pub project_pledge: u64,
    pub project_creation_fee: u64,
    pub project_sponsorship_min_fee: u64,
    pub project_sponsorship_duration: u64,
    pub stake_key_deposit: u64,
    /// Minimum delay between a proposal's submission and its effect.
    pub proposal_waiting_period: u64,
    pub project_delist_waiting_period: u64,
}

impl PlutusType for ProtocolParamsDatum {
    fn schema() -> Schema {
        Schema::record(
            "ProtocolParamsDatum",
            vec![
                Field::new("registry", Registry::schema()),
                Field::new("governor_address", PlutusAddress::schema()),
                u64_field("governor_share_ratio"),
                u64_field("protocol_funds_share_ratio"),
                u64_field("discount_cent_price"),
                Field::new("project_milestones", Vec::<u64>::schema()),
                u64_field("teiki_coefficient"),
                u64_field("project_teiki_burn_rate"),
                u64_field("epoch_length"),
                u64_field("project_pledge"),
                u64_field("project_creation_fee"),
                u64_field("project_sponsorship_min_fee"),
                u64_field("project_sponsorship_duration"),
                u64_field("stake_key_deposit"),
                u64_field("proposal_waiting_period"),
                u64_field("project_delist_waiting_period"),
            ],
        )
    }

    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![
                self.registry.to_plutus_data(),
                self.governor_address.to_plutus_data(),
                self.governor_share_ratio.to_plutus_data(),
                self.protocol_funds_share_ratio.to_plutus_data(),
                self.discount_cent_price.to_plutus_data(),
                self.project_milestones.to_plutus_data(),
                self.teiki_coefficient.to_plutus_data(),
                self.project_teiki_burn_rate.to_plutus_data(),
                self.epoch_length.to_plutus_data(),
                self.project_pledge.to_plutus_data(),
                self.project_creation_fee.to_plutus_data(),
                self.project_sponsorship_min_fee.to_plutus_data(),
                self.project_sponsorship_duration.to_plutus_data(),
                self.stake_key_deposit.to_plutus_data(),
                self.proposal_waiting_period.to_plutus_data(),
                self.project_delist_waiting_period.to_plutus_data(),
            ],
        )
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        let mut f = Fields::of(data, "ProtocolParamsDatum", 0)?;
        Ok(Self {
            registry: f.next()?,
            governor_address: f.next()?,
            governor_share_ratio: f.next()?,
            protocol_funds_share_ratio: f.next()?,
            discount_cent_price: f.next()?,
            project_milestones: f.next()?,
            teiki_coefficient: f.next()?,
            project_teiki_burn_rate: f.next()?,
            epoch_length: f.next()?,
            project_pledge: f.next()?,
            project_creation_fee: f.next()?,
            project_sponsorship_min_fee: f.next()?,
            project_sponsorship_duration: f.next()?,
            stake_key_deposit: f.next()?,
            proposal_waiting_period: f.next()?,
            project_delist_waiting_period: f.next()?,
        })
    }
}

// ---------------------------------------------------------------------------
// ProtocolProposalDatum
// ---------------------------------------------------------------------------

/// A pending parameter change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedParams {
    /// Earliest POSIX millisecond at which the change may be applied.
    pub in_effect_at: u64,
    /// The params UTxO the proposal replaces. Applying against any other
    /// UTxO is rejected.
    pub base: OutRef,
    pub params: ProtocolParamsDatum,
}

impl PlutusType for ProposedParams {
    fn schema() -> Schema {
        Schema::record(
            "ProposedParams",
            vec![
                u64_field("in_effect_at"),
                Field::new("base", OutRef::schema()),
                Field::new("params", ProtocolParamsDatum::schema()),
            ],
        )
    }

    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![
                self.in_effect_at.to_plutus_data(),
                self.base.to_plutus_data(),
                self.params.to_plutus_data(),
            ],
        )
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        let mut f = Fields::of(data, "ProposedParams", 0)?;
        Ok(Self {
            in_effect_at: f.next()?,
            base: f.next()?,
            params: f.next()?,
        })
    }
}

/// Datum of the proposal UTxO. `proposal` is `None` between proposals.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProtocolProposalDatum {
    pub proposal: Option<ProposedParams>,
}

impl PlutusType for ProtocolProposalDatum {
    fn schema() -> Schema {
        Schema::record(
            "ProtocolProposalDatum",
            vec![Field::new("proposal", Option::<ProposedParams>::schema())],
        )
    }

    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::constr(0, vec![self.proposal.to_plutus_data()])
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        let mut f = Fields::of(data, "ProtocolProposalDatum", 0)?;
        Ok(Self {
            proposal: f.next()?,
        })
    }
}

// ---------------------------------------------------------------------------
// BackingDatum
// ---------------------------------------------------------------------------

/// A backer's commitment to a project, locked at the backing validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackingDatum {
    pub project_id: Hash<32>,
    pub backer_address: PlutusAddress,
    /// POSIX milliseconds.
    pub backed_at: u64,
    /// Milestone the project had reached when the backing was made.
    pub milestone_backed: u64,
}

impl PlutusType for BackingDatum {
    fn schema() -> Schema {
        Schema::record(
            "BackingDatum",
            vec![
                Field::new("project_id", Hash::<32>::schema()),
                Field::new("backer_address", PlutusAddress::schema()),
                u64_field("backed_at"),
                u64_field("milestone_backed"),
            ],
        )
    }

    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![
                self.project_id.to_plutus_data(),
                self.backer_address.to_plutus_data(),
                self.backed_at.to_plutus_data(),
                self.milestone_backed.to_plutus_data(),
            ],
        )
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        let mut f = Fields::of(data, "BackingDatum", 0)?;
        Ok(Self {
            project_id: f.next()?,
            backer_address: f.next()?,
            backed_at: f.next()?,
            milestone_backed: f.next()?,
        })
    }
}
