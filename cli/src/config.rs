//! CLI configuration with TOML file support.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration. Command-line flags override what the file says.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use teiki_protocol::config::NETWORK_ID_TESTNET;
use teiki_protocol::LedgerParams;

use crate::logging::LogFormat;

/// Configuration for the `teiki` binary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Network nibble for addresses the CLI derives (wallet, change).
    #[serde(default = "default_network_id")]
    pub network_id: u8,

    #[serde(default)]
    pub log_format: LogFormat,

    /// JSON ledger snapshot read before and written after every command.
    #[serde(default = "default_ledger_state")]
    pub ledger_state: PathBuf,

    /// Hex-encoded 32-byte ed25519 secret key of the wallet that pays fees
    /// and signs.
    #[serde(default)]
    pub wallet_key: Option<String>,

    /// Fee and balance parameters. When set, they replace the ones stored
    /// in the ledger snapshot. Kept last: TOML tables follow plain values.
    #[serde(default)]
    pub ledger: Option<LedgerParams>,
}

fn default_network_id() -> u8 {
    NETWORK_ID_TESTNET
}

fn default_ledger_state() -> PathBuf {
    PathBuf::from("./teiki-ledger.json")
}

impl CliConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            network_id: default_network_id(),
            log_format: LogFormat::default(),
            ledger_state: default_ledger_state(),
            wallet_key: None,
            ledger: None,
        }
    }
}
