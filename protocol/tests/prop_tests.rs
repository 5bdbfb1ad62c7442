//! Property tests for the Plutus data codec and the ledger types that map
//! onto it.

use proptest::prelude::*;

use teiki_protocol::crypto::hash::Hash;
use teiki_protocol::data::plutus::MAX_DECODE_DEPTH;
use teiki_protocol::data::{decode, encode, from_cbor, to_cbor, PlutusData, PlutusType};
use teiki_protocol::ledger::{Credential, OutRef, PlutusAddress, StakeCredential};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn leaf() -> impl Strategy<Value = PlutusData> {
    prop_oneof![
        any::<i128>().prop_map(PlutusData::Integer),
        // Straddles the 64-byte chunk size.
        prop::collection::vec(any::<u8>(), 0..200).prop_map(PlutusData::Bytes),
    ]
}

/// Arbitrary data, kept well inside the decoder's nesting limit.
fn plutus_data() -> impl Strategy<Value = PlutusData> {
    leaf().prop_recursive(6, 96, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(PlutusData::List),
            prop::collection::vec((inner.clone(), inner.clone()), 0..4).prop_map(PlutusData::Map),
            // Every constructor tag form: small, large and general.
            (0u64..300, prop::collection::vec(inner, 0..6))
                .prop_map(|(alt, fields)| PlutusData::constr(alt, fields)),
        ]
    })
}

fn credential() -> impl Strategy<Value = Credential> {
    (any::<bool>(), prop::array::uniform28(any::<u8>())).prop_map(|(script, bytes)| {
        if script {
            Credential::Script(Hash::from(bytes))
        } else {
            Credential::Key(Hash::from(bytes))
        }
    })
}

fn plutus_address() -> impl Strategy<Value = PlutusAddress> {
    let stake = prop_oneof![
        Just(None),
        credential().prop_map(|c| Some(StakeCredential::Inline(c))),
        (any::<u64>(), any::<u64>(), any::<u64>()).prop_map(|(slot, tx_index, cert_index)| {
            Some(StakeCredential::Pointer {
                slot,
                tx_index,
                cert_index,
            })
        }),
    ];
    (credential(), stake).prop_map(|(payment_credential, stake_credential)| PlutusAddress {
        payment_credential,
        stake_credential,
    })
}

fn depth(data: &PlutusData) -> usize {
    match data {
        PlutusData::Constr { fields, .. } | PlutusData::List(fields) => {
            1 + fields.iter().map(depth).max().unwrap_or(0)
        }
        PlutusData::Map(entries) => {
            1 + entries
                .iter()
                .map(|(k, v)| depth(k).max(depth(v)))
                .max()
                .unwrap_or(0)
        }
        PlutusData::Integer(_) | PlutusData::Bytes(_) => 0,
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    /// Any data survives CBOR encode -> decode unchanged.
    #[test]
    fn plutus_data_cbor_roundtrip(data in plutus_data()) {
        prop_assume!(depth(&data) <= MAX_DECODE_DEPTH);
        let cbor = data.to_cbor();
        prop_assert_eq!(PlutusData::from_cbor(&cbor).unwrap(), data);
    }

    /// Encoding is deterministic: re-encoding decoded bytes reproduces them.
    #[test]
    fn plutus_data_encoding_is_canonical(data in plutus_data()) {
        let cbor = data.to_cbor();
        let again = PlutusData::from_cbor(&cbor).unwrap().to_cbor();
        prop_assert_eq!(again, cbor);
    }

    /// Any integer in range decodes back to itself, small head or bignum.
    #[test]
    fn integer_roundtrip(n in any::<i128>()) {
        let data = PlutusData::Integer(n);
        prop_assert_eq!(PlutusData::from_cbor(&data.to_cbor()).unwrap(), data);
    }

    /// Truncating an encoding anywhere never decodes successfully.
    #[test]
    fn truncated_encoding_is_rejected(data in plutus_data(), cut in any::<prop::sample::Index>()) {
        let cbor = data.to_cbor();
        let at = cut.index(cbor.len());
        prop_assert!(PlutusData::from_cbor(&cbor[..at]).is_err());
    }

    /// OutRef roundtrip through the typed layer and CBOR.
    #[test]
    fn out_ref_roundtrip(tx_id in prop::array::uniform32(any::<u8>()), index in any::<u32>()) {
        let out_ref = OutRef::new(Hash::from(tx_id), index);
        prop_assert!(OutRef::schema().check(&encode(&out_ref)).is_ok());
        prop_assert_eq!(from_cbor::<OutRef>(&to_cbor(&out_ref)).unwrap(), out_ref);
    }

    /// Addresses keep both credentials and the pointer form.
    #[test]
    fn plutus_address_roundtrip(address in plutus_address()) {
        let data = encode(&address);
        prop_assert!(PlutusAddress::schema().check(&data).is_ok());
        prop_assert_eq!(decode::<PlutusAddress>(&data).unwrap(), address);
    }

    /// Optional lists of integers, the shape most datum fields reduce to.
    #[test]
    fn option_vec_roundtrip(value in prop::option::of(prop::collection::vec(any::<u64>(), 0..10))) {
        prop_assert_eq!(from_cbor::<Option<Vec<u64>>>(&to_cbor(&value)).unwrap(), value);
    }
}
