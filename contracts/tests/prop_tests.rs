//! Property tests for the governance datums: whatever an action writes, the
//! next action must read back unchanged.

use proptest::prelude::*;

use teiki_contracts::{
    BackingDatum, ProposedParams, ProtocolParamsDatum, ProtocolProposalDatum, Registry,
};
use teiki_protocol::crypto::hash::Hash;
use teiki_protocol::data::{decode, encode, from_cbor, to_cbor, PlutusType};
use teiki_protocol::ledger::{Credential, OutRef, PlutusAddress, StakeCredential};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn script_hash() -> impl Strategy<Value = Hash<28>> {
    prop::array::uniform28(any::<u8>()).prop_map(Hash::from)
}

fn registry() -> impl Strategy<Value = Registry> {
    prop::array::uniform5(script_hash()).prop_map(|[a, b, c, d, e]| Registry {
        protocol_staking_validator: a,
        project_validator: b,
        backing_validator: c,
        shared_treasury_validator: d,
        open_treasury_validator: e,
    })
}

fn plutus_address() -> impl Strategy<Value = PlutusAddress> {
    (script_hash(), prop::option::of(script_hash())).prop_map(|(payment, stake)| PlutusAddress {
        payment_credential: Credential::Key(payment),
        stake_credential: stake.map(|h| StakeCredential::Inline(Credential::Script(h))),
    })
}

fn params_datum() -> impl Strategy<Value = ProtocolParamsDatum> {
    (
        registry(),
        plutus_address(),
        prop::collection::vec(any::<u64>(), 0..5),
        prop::array::uniform13(any::<u64>()),
    )
        .prop_map(|(registry, governor_address, project_milestones, n)| {
            ProtocolParamsDatum {
                registry,
                governor_address,
                governor_share_ratio: n[0],
                protocol_funds_share_ratio: n[1],
                discount_cent_price: n[2],
                project_milestones,
                teiki_coefficient: n[3],
                project_teiki_burn_rate: n[4],
                epoch_length: n[5],
                project_pledge: n[6],
                project_creation_fee: n[7],
                project_sponsorship_min_fee: n[8],
                project_sponsorship_duration: n[9],
                stake_key_deposit: n[10],
                proposal_waiting_period: n[11],
                project_delist_waiting_period: n[12],
            }
        })
}

fn proposal_datum() -> impl Strategy<Value = ProtocolProposalDatum> {
    prop::option::of(
        (
            any::<u64>(),
            prop::array::uniform32(any::<u8>()),
            any::<u32>(),
            params_datum(),
        )
            .prop_map(|(in_effect_at, tx_id, index, params)| ProposedParams {
                in_effect_at,
                base: OutRef::new(Hash::from(tx_id), index),
                params,
            }),
    )
    .prop_map(|proposal| ProtocolProposalDatum { proposal })
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    /// Params datum roundtrip through CBOR, conforming to its schema.
    #[test]
    fn params_datum_roundtrip(datum in params_datum()) {
        prop_assert!(ProtocolParamsDatum::schema().check(&encode(&datum)).is_ok());
        prop_assert_eq!(from_cbor::<ProtocolParamsDatum>(&to_cbor(&datum)).unwrap(), datum);
    }

    /// Proposal datum roundtrip, both empty and pending.
    #[test]
    fn proposal_datum_roundtrip(datum in proposal_datum()) {
        let data = encode(&datum);
        prop_assert!(ProtocolProposalDatum::schema().check(&data).is_ok());
        prop_assert_eq!(decode::<ProtocolProposalDatum>(&data).unwrap(), datum);
    }

    /// Backing datum roundtrip through CBOR.
    #[test]
    fn backing_datum_roundtrip(
        project_id in prop::array::uniform32(any::<u8>()),
        backer_address in plutus_address(),
        backed_at in any::<u64>(),
        milestone_backed in any::<u64>(),
    ) {
        let datum = BackingDatum {
            project_id: Hash::from(project_id),
            backer_address,
            backed_at,
            milestone_backed,
        };
        prop_assert_eq!(from_cbor::<BackingDatum>(&to_cbor(&datum)).unwrap(), datum);
    }

    /// A params datum never decodes as a backing datum.
    #[test]
    fn params_datum_is_not_a_backing_datum(datum in params_datum()) {
        prop_assert!(decode::<BackingDatum>(&encode(&datum)).is_err());
    }
}
