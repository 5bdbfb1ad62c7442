//! # Protocol Redeemers
//!
//! Each redeemer is a closed enum of unit variants, encoded as
//! `Constr <index> []` with indices in declaration order.

use teiki_protocol::data::{
    unknown_variant, variant_of, CodecError, PlutusData, PlutusType, Schema, Variant,
};

/// Schema of a sum type whose variants carry no fields.
fn unit_sum(name: &'static str, variants: &[&'static str]) -> Schema {
    Schema::sum(name, variants.iter().copied().map(Variant::unit).collect())
}

/// Redeemer of the Teiki minting policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeikiMintingRedeemer {
    Mint,
    Burn,
    Evolve,
}

impl PlutusType for TeikiMintingRedeemer {
    fn schema() -> Schema {
        unit_sum("TeikiMintingRedeemer", &["Mint", "Burn", "Evolve"])
    }

    fn to_plutus_data(&self) -> PlutusData {
        let alternative = match self {
            Self::Mint => 0,
            Self::Burn => 1,
            Self::Evolve => 2,
        };
        PlutusData::constr(alternative, Vec::new())
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        match variant_of(data, "TeikiMintingRedeemer")? {
            (0, []) => Ok(Self::Mint),
            (1, []) => Ok(Self::Burn),
            (2, []) => Ok(Self::Evolve),
            (alt, _) => Err(unknown_variant("TeikiMintingRedeemer", alt)),
        }
    }
}

/// Redeemer for spending the protocol params UTxO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolParamsRedeemer {
    ApplyProposal,
    Migrate,
}

impl PlutusType for ProtocolParamsRedeemer {
    fn schema() -> Schema {
        unit_sum("ProtocolParamsRedeemer", &["ApplyProposal", "Migrate"])
    }

    fn to_plutus_data(&self) -> PlutusData {
        let alternative = match self {
            Self::ApplyProposal => 0,
            Self::Migrate => 1,
        };
        PlutusData::constr(alternative, Vec::new())
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        match variant_of(data, "ProtocolParamsRedeemer")? {
            (0, []) => Ok(Self::ApplyProposal),
            (1, []) => Ok(Self::Migrate),
            (alt, _) => Err(unknown_variant("ProtocolParamsRedeemer", alt)),
        }
    }
}

/// Redeemer for spending the protocol proposal UTxO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolProposalRedeemer {
    Propose,
    Apply,
    Cancel,
}

impl PlutusType for ProtocolProposalRedeemer {
    fn schema() -> Schema {
        unit_sum("ProtocolProposalRedeemer", &["Propose", "Apply", "Cancel"])
    }

    fn to_plutus_data(&self) -> PlutusData {
        let alternative = match self {
            Self::Propose => 0,
            Self::Apply => 1,
            Self::Cancel => 2,
        };
        PlutusData::constr(alternative, Vec::new())
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        match variant_of(data, "ProtocolProposalRedeemer")? {
            (0, []) => Ok(Self::Propose),
            (1, []) => Ok(Self::Apply),
            (2, []) => Ok(Self::Cancel),
            (alt, _) => Err(unknown_variant("ProtocolProposalRedeemer", alt)),
        }
    }
}

/// The void redeemer (`Constr 0 []`) used to reclaim UTxOs held by the
/// protocol script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProtocolScriptRedeemer;

impl PlutusType for ProtocolScriptRedeemer {
    fn schema() -> Schema {
        unit_sum("ProtocolScriptRedeemer", &["Void"])
    }

    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::void()
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        match variant_of(data, "ProtocolScriptRedeemer")? {
            (0, []) => Ok(Self),
            (alt, _) => Err(unknown_variant("ProtocolScriptRedeemer", alt)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teiki_protocol::data::{decode, encode, serialize};

    #[test]
    fn test_teiki_redeemer_tags() {
        assert_eq!(encode(&TeikiMintingRedeemer::Mint), PlutusData::constr(0, vec![]));
        assert_eq!(encode(&TeikiMintingRedeemer::Burn), PlutusData::constr(1, vec![]));
        assert_eq!(encode(&TeikiMintingRedeemer::Evolve), PlutusData::constr(2, vec![]));
        assert_eq!(hex_of(&TeikiMintingRedeemer::Burn), "d87a80");
    }

    #[test]
    fn test_all_variants_roundtrip() {
        for r in [
            TeikiMintingRedeemer::Mint,
            TeikiMintingRedeemer::Burn,
            TeikiMintingRedeemer::Evolve,
        ] {
            assert_eq!(decode::<TeikiMintingRedeemer>(&encode(&r)).unwrap(), r);
        }
        for r in [ProtocolParamsRedeemer::ApplyProposal, ProtocolParamsRedeemer::Migrate] {
            assert_eq!(decode::<ProtocolParamsRedeemer>(&encode(&r)).unwrap(), r);
        }
        for r in [
            ProtocolProposalRedeemer::Propose,
            ProtocolProposalRedeemer::Apply,
            ProtocolProposalRedeemer::Cancel,
        ] {
            assert_eq!(decode::<ProtocolProposalRedeemer>(&encode(&r)).unwrap(), r);
        }
        assert_eq!(
            decode::<ProtocolScriptRedeemer>(&encode(&ProtocolScriptRedeemer)).unwrap(),
            ProtocolScriptRedeemer
        );
    }

    #[test]
    fn test_void_is_d87980() {
        assert_eq!(hex_of(&ProtocolScriptRedeemer), "d87980");
    }

    #[test]
    fn test_unknown_tag_and_stray_fields_rejected() {
        assert!(decode::<TeikiMintingRedeemer>(&PlutusData::constr(3, vec![])).is_err());
        assert!(decode::<ProtocolProposalRedeemer>(&PlutusData::constr(
            0,
            vec![PlutusData::Integer(1)]
        ))
        .is_err());
    }

    fn hex_of<T: PlutusType>(value: &T) -> String {
        hex::encode(serialize(&encode(value)))
    }
}
