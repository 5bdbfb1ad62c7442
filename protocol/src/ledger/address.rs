//! Shelley addresses: the ledger form (bech32, network-tagged) and the
//! Plutus form (what validators see inside datums and script contexts).
//!
//! ```text
//! header: | type (4 bits) | network (4 bits) |
//!   0  key / key          4  key / pointer      6  key (enterprise)
//!   1  script / key       5  script / pointer   7  script (enterprise)
//!   2  key / script
//!   3  script / script
//! body:   payment credential (28) [ stake credential (28) | pointer varints ]
//! ```
//!
//! The Plutus form drops the network nibble, so converting back to a ledger
//! address needs the network supplied by the caller.

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{hrp_for_network, KEY_HASH_LENGTH};
use crate::crypto::hash::{Hash, KeyHash, ScriptHash};
use crate::data::{
    unknown_variant, variant_of, CodecError, Field, Fields, PlutusData, PlutusType, Schema,
    Variant,
};

/// Errors from parsing or encoding addresses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("bech32 error: {0}")]
    Bech32(String),

    #[error("unknown network id {0}")]
    UnknownNetwork(u8),

    #[error("prefix {got} does not match network (expected {expected})")]
    PrefixMismatch { expected: String, got: String },

    #[error("unsupported address type {0:#x} (only Shelley payment addresses)")]
    UnsupportedType(u8),

    #[error("invalid address length {0}")]
    InvalidLength(usize),

    #[error("malformed stake pointer")]
    MalformedPointer,
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Who may spend (or stake) the funds at an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Credential {
    Key(KeyHash),
    Script(ScriptHash),
}

impl Credential {
    pub fn hash(&self) -> &Hash<KEY_HASH_LENGTH> {
        match self {
            Credential::Key(h) | Credential::Script(h) => h,
        }
    }

    pub fn is_script(&self) -> bool {
        matches!(self, Credential::Script(_))
    }
}

/// Plutus `Credential`: `PubKeyCredential` = 0, `ScriptCredential` = 1.
impl PlutusType for Credential {
    fn schema() -> Schema {
        Schema::sum(
            "Credential",
            vec![
                Variant::new(
                    "PubKeyCredential",
                    vec![Field::new("key_hash", Schema::FixedBytes(KEY_HASH_LENGTH))],
                ),
                Variant::new(
                    "ScriptCredential",
                    vec![Field::new("script_hash", Schema::FixedBytes(KEY_HASH_LENGTH))],
                ),
            ],
        )
    }

    fn to_plutus_data(&self) -> PlutusData {
        match self {
            Credential::Key(h) => PlutusData::constr(0, vec![h.to_plutus_data()]),
            Credential::Script(h) => PlutusData::constr(1, vec![h.to_plutus_data()]),
        }
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        match variant_of(data, "Credential")? {
            (0, [h]) => Ok(Credential::Key(Hash::from_plutus_data(h)?)),
            (1, [h]) => Ok(Credential::Script(Hash::from_plutus_data(h)?)),
            (alt, _) => Err(unknown_variant("Credential", alt)),
        }
    }
}

/// Stake part of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StakeCredential {
    Inline(Credential),
    Pointer {
        slot: u64,
        tx_index: u64,
        cert_index: u64,
    },
}

/// Plutus `StakingCredential`: `StakingHash` = 0, `StakingPtr` = 1.
impl PlutusType for StakeCredential {
    fn schema() -> Schema {
        Schema::sum(
            "StakingCredential",
            vec![
                Variant::new(
                    "StakingHash",
                    vec![Field::new("credential", Credential::schema())],
                ),
                Variant::new(
                    "StakingPtr",
                    vec![
                        Field::new("slot", Schema::Integer),
                        Field::new("tx_index", Schema::Integer),
                        Field::new("cert_index", Schema::Integer),
                    ],
                ),
            ],
        )
    }

    fn to_plutus_data(&self) -> PlutusData {
        match self {
            StakeCredential::Inline(c) => PlutusData::constr(0, vec![c.to_plutus_data()]),
            StakeCredential::Pointer {
                slot,
                tx_index,
                cert_index,
            } => PlutusData::constr(
                1,
                vec![
                    slot.to_plutus_data(),
                    tx_index.to_plutus_data(),
                    cert_index.to_plutus_data(),
                ],
            ),
        }
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        match variant_of(data, "StakingCredential")? {
            (0, _) => {
                let mut f = Fields::of(data, "StakingHash", 0)?;
                Ok(StakeCredential::Inline(f.next()?))
            }
            (1, _) => {
                let mut f = Fields::of(data, "StakingPtr", 1)?;
                Ok(StakeCredential::Pointer {
                    slot: f.next()?,
                    tx_index: f.next()?,
                    cert_index: f.next()?,
                })
            }
            (alt, _) => Err(unknown_variant("StakingCredential", alt)),
        }
    }
}

// ---------------------------------------------------------------------------
// PlutusAddress
// ---------------------------------------------------------------------------

/// An address as validators see it: credentials only, no network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlutusAddress {
    pub payment_credential: Credential,
    pub stake_credential: Option<StakeCredential>,
}

impl PlutusAddress {
    /// The payment key hash, if the address is locked by a plain key.
    pub fn payment_key_hash(&self) -> Option<KeyHash> {
        match self.payment_credential {
            Credential::Key(h) => Some(h),
            Credential::Script(_) => None,
        }
    }

    /// Re-attaches a network to obtain a ledger address.
    pub fn to_address(&self, network_id: u8) -> Address {
        Address {
            network_id,
            payment: self.payment_credential,
            stake: self.stake_credential,
        }
    }
}

/// `Address = Constr 0 [Credential, Maybe StakingCredential]`.
impl PlutusType for PlutusAddress {
    fn schema() -> Schema {
        Schema::record(
            "Address",
            vec![
                Field::new("payment_credential", Credential::schema()),
                Field::new("stake_credential", Option::<StakeCredential>::schema()),
            ],
        )
    }

    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![
                self.payment_credential.to_plutus_data(),
                self.stake_credential.to_plutus_data(),
            ],
        )
    }

    fn from_plutus_data(data: &PlutusData) -> Result<Self, CodecError> {
        let mut f = Fields::of(data, "Address", 0)?;
        Ok(Self {
            payment_credential: f.next()?,
            stake_credential: f.next()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A Shelley payment address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    pub network_id: u8,
    pub payment: Credential,
    pub stake: Option<StakeCredential>,
}

impl Address {
    /// Enterprise address (no stake part) locked by a key.
    pub fn from_key_hash(network_id: u8, key_hash: KeyHash) -> Self {
        Self {
            network_id,
            payment: Credential::Key(key_hash),
            stake: None,
        }
    }

    /// Enterprise address locked by a script.
    pub fn from_script_hash(network_id: u8, script_hash: ScriptHash) -> Self {
        Self {
            network_id,
            payment: Credential::Script(script_hash),
            stake: None,
        }
    }

    pub fn with_stake(mut self, stake: StakeCredential) -> Self {
        self.stake = Some(stake);
        self
    }

    pub fn is_script(&self) -> bool {
        self.payment.is_script()
    }

    pub fn to_plutus(&self) -> PlutusAddress {
        PlutusAddress {
            payment_credential: self.payment,
            stake_credential: self.stake,
        }
    }

    /// Raw address bytes: header, payment hash, stake part.
    pub fn to_bytes(&self) -> Vec<u8> {
        let payment_bit = u8::from(self.payment.is_script());
        let (type_nibble, stake_bytes) = match &self.stake {
            Some(StakeCredential::Inline(c)) => {
                let stake_bit = u8::from(c.is_script());
                (payment_bit | (stake_bit << 1), c.hash().as_bytes().to_vec())
            }
            Some(StakeCredential::Pointer {
                slot,
                tx_index,
                cert_index,
            }) => {
                let mut buf = Vec::new();
                for n in [*slot, *tx_index, *cert_index] {
                    write_varint(n, &mut buf);
                }
                (0b0100 | payment_bit, buf)
            }
            None => (0b0110 | payment_bit, Vec::new()),
        };

        let mut out = Vec::with_capacity(1 + KEY_HASH_LENGTH + stake_bytes.len());
        out.push((type_nibble << 4) | (self.network_id & 0x0F));
        out.extend_from_slice(self.payment.hash().as_bytes());
        out.extend_from_slice(&stake_bytes);
        out
    }

    /// Parses raw address bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
        let header = *bytes.first().ok_or(AddressError::InvalidLength(0))?;
        let type_nibble = header >> 4;
        let network_id = header & 0x0F;
        if type_nibble > 7 {
            return Err(AddressError::UnsupportedType(type_nibble));
        }

        let body = &bytes[1..];
        if body.len() < KEY_HASH_LENGTH {
            return Err(AddressError::InvalidLength(bytes.len()));
        }
        let (payment_bytes, rest) = body.split_at(KEY_HASH_LENGTH);
        let payment_hash = Hash::from_slice(payment_bytes)
            .map_err(|_| AddressError::InvalidLength(bytes.len()))?;
        let payment = if type_nibble & 0b0001 == 0 {
            Credential::Key(payment_hash)
        } else {
            Credential::Script(payment_hash)
        };

        let stake = match type_nibble {
            0..=3 => {
                let stake_hash =
                    Hash::from_slice(rest).map_err(|_| AddressError::InvalidLength(bytes.len()))?;
                Some(StakeCredential::Inline(if type_nibble & 0b0010 == 0 {
                    Credential::Key(stake_hash)
                } else {
                    Credential::Script(stake_hash)
                }))
            }
            4 | 5 => {
                let mut cursor = rest;
                let slot = read_varint(&mut cursor)?;
                let tx_index = read_varint(&mut cursor)?;
                let cert_index = read_varint(&mut cursor)?;
                if !cursor.is_empty() {
                    return Err(AddressError::MalformedPointer);
                }
                Some(StakeCredential::Pointer {
                    slot,
                    tx_index,
                    cert_index,
                })
            }
            _ => {
                if !rest.is_empty() {
                    return Err(AddressError::InvalidLength(bytes.len()));
                }
                None
            }
        };

        Ok(Self {
            network_id,
            payment,
            stake,
        })
    }

    /// Bech32 form with the network's prefix.
    pub fn to_bech32(&self) -> Result<String, AddressError> {
        let prefix =
            hrp_for_network(self.network_id).ok_or(AddressError::UnknownNetwork(self.network_id))?;
        let hrp = Hrp::parse(prefix).map_err(|e| AddressError::Bech32(e.to_string()))?;
        bech32::encode::<Bech32>(hrp, &self.to_bytes())
            .map_err(|e| AddressError::Bech32(e.to_string()))
    }

    /// Parses a bech32 address and checks that its prefix agrees with the
    /// network nibble in the header.
    pub fn from_bech32(s: &str) -> Result<Self, AddressError> {
        let (hrp, data) = bech32::decode(s).map_err(|e| AddressError::Bech32(e.to_string()))?;
        let address = Self::from_bytes(&data)?;
        let expected = hrp_for_network(address.network_id)
            .ok_or(AddressError::UnknownNetwork(address.network_id))?;
        if hrp.as_str() != expected {
            return Err(AddressError::PrefixMismatch {
                expected: expected.to_string(),
                got: hrp.to_string(),
            });
        }
        Ok(address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_bech32() {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "0x{}", hex::encode(self.to_bytes())),
        }
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bech32(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let s = self.to_bech32().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&s)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Base-128 big-endian with a continuation bit on every byte but the last.
fn write_varint(mut n: u64, out: &mut Vec<u8>) {
    let mut groups = vec![(n & 0x7F) as u8];
    n >>= 7;
    while n > 0 {
        groups.push(((n & 0x7F) as u8) | 0x80);
        n >>= 7;
    }
    groups.reverse();
    out.extend_from_slice(&groups);
}

fn read_varint(cursor: &mut &[u8]) -> Result<u64, AddressError> {
    let mut n: u64 = 0;
    loop {
        let (&byte, rest) = cursor.split_first().ok_or(AddressError::MalformedPointer)?;
        *cursor = rest;
        n = n
            .checked_mul(128)
            .and_then(|v| v.checked_add(u64::from(byte & 0x7F)))
            .ok_or(AddressError::MalformedPointer)?;
        if byte & 0x80 == 0 {
            return Ok(n);
        }
    }
}
