//! # Protocol Configuration & Constants
//!
//! Every magic number the toolkit relies on lives here. The on-chain
//! validators were compiled against these values, so changing one of them is
//! a redeploy, not a refactor.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Network Identifiers
// ---------------------------------------------------------------------------

/// Network nibble carried in the low bits of every Shelley address header.
pub const NETWORK_ID_MAINNET: u8 = 1;

/// Network nibble for every test network (preprod, preview, private).
pub const NETWORK_ID_TESTNET: u8 = 0;

/// Bech32 human-readable prefixes for payment addresses.
pub const MAINNET_ADDRESS_HRP: &str = "addr";
pub const TESTNET_ADDRESS_HRP: &str = "addr_test";

// ---------------------------------------------------------------------------
// Hash Widths
// ---------------------------------------------------------------------------

/// Key hashes and script hashes are blake2b-224 digests.
pub const KEY_HASH_LENGTH: usize = 28;

/// Script hashes share the key-hash width; the ledger tells them apart by
/// credential tag, not by length.
pub const SCRIPT_HASH_LENGTH: usize = 28;

/// Transaction ids and datum hashes are blake2b-256 digests.
pub const TX_HASH_LENGTH: usize = 32;

/// Longest asset name the ledger accepts.
pub const MAX_ASSET_NAME_LENGTH: usize = 32;

/// Prefix byte hashed together with a Plutus V2 script to obtain its hash.
pub const PLUTUS_V2_SCRIPT_TAG: u8 = 0x02;

// ---------------------------------------------------------------------------
// Teiki
// ---------------------------------------------------------------------------

/// Token name minted under the Teiki minting policy. The policy only ever
/// mints this one name, so the asset unit is fully determined by the policy
/// hash.
pub const TEIKI_TOKEN_NAME: &[u8] = b"teiki";

// ---------------------------------------------------------------------------
// Plutus Data Encoding
// ---------------------------------------------------------------------------

/// CBOR tag for constructor alternatives 0..=6 (`121 + alt`).
pub const CONSTR_TAG_SMALL_BASE: u64 = 121;

/// CBOR tag for constructor alternatives 7..=127 (`1280 + alt - 7`).
pub const CONSTR_TAG_LARGE_BASE: u64 = 1280;

/// General constructor tag: `102([alt, fields])` for any other alternative.
pub const CONSTR_TAG_GENERAL: u64 = 102;

/// Bignum tags from RFC 8949 for integers beyond 64 bits of magnitude.
pub const BIGNUM_POSITIVE_TAG: u64 = 2;
pub const BIGNUM_NEGATIVE_TAG: u64 = 3;

/// Byte strings longer than this are emitted as indefinite strings of
/// chunks of exactly this size. Plutus rejects longer chunks on-chain.
pub const PLUTUS_BYTES_CHUNK_SIZE: usize = 64;

// ---------------------------------------------------------------------------
// Fee & Balance Defaults
// ---------------------------------------------------------------------------

/// Linear fee coefficient, lovelace per byte.
pub const DEFAULT_MIN_FEE_A: u64 = 44;

/// Linear fee constant, lovelace.
pub const DEFAULT_MIN_FEE_B: u64 = 155_381;

/// Flat execution-budget charge added per redeemer. The toolkit does not run
/// scripts, so it budgets a conservative ceiling per redeemer instead.
pub const DEFAULT_SCRIPT_FEE_PER_REDEEMER: u64 = 350_000;

/// Size estimate of one vkey witness (key + signature + CBOR framing).
pub const VKEY_WITNESS_SIZE_ESTIMATE: u64 = 101;

/// Change below this is absorbed into the fee instead of producing an
/// output the ledger would reject as dust.
pub const DEFAULT_MIN_CHANGE_LOVELACE: u64 = 1_000_000;

/// Upper bound on fee/balance fixed-point iterations in `complete()`.
pub const MAX_BALANCE_ITERATIONS: usize = 8;

/// Ledger-wide parameters consumed when a transaction is finalized.
///
/// Defaults mirror current mainnet values; tests and the emulator override
/// them freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerParams {
    /// Which network addresses and change outputs belong to.
    pub network_id: u8,
    pub min_fee_a: u64,
    pub min_fee_b: u64,
    pub script_fee_per_redeemer: u64,
    pub min_change_lovelace: u64,
}

impl Default for LedgerParams {
    fn default() -> Self {
        Self {
            network_id: NETWORK_ID_TESTNET,
            min_fee_a: DEFAULT_MIN_FEE_A,
            min_fee_b: DEFAULT_MIN_FEE_B,
            script_fee_per_redeemer: DEFAULT_SCRIPT_FEE_PER_REDEEMER,
            min_change_lovelace: DEFAULT_MIN_CHANGE_LOVELACE,
        }
    }
}

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Returns the bech32 prefix for a network nibble, or `None` for nibbles the
/// ledger does not define.
pub fn hrp_for_network(network_id: u8) -> Option<&'static str> {
    match network_id {
        NETWORK_ID_MAINNET => Some(MAINNET_ADDRESS_HRP),
        NETWORK_ID_TESTNET => Some(TESTNET_ADDRESS_HRP),
        _ => None,
    }
}

/// Returns a friendly network name, mainly for logging.
pub fn network_name(network_id: u8) -> String {
    match network_id {
        NETWORK_ID_MAINNET => "mainnet".to_string(),
        NETWORK_ID_TESTNET => "testnet".to_string(),
        other => format!("unknown({})", other),
    }
}
