//! # CLI Interface
//!
//! Argument structure for `teiki`, using `clap` derive. One subcommand per
//! governance action plus `version`. UTxOs are named by out-ref
//! (`<tx hash hex>#<index>`) and resolved against the ledger.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use teiki_protocol::crypto::hash::Hash;
use teiki_protocol::ledger::{Address, OutRef};

use crate::logging::LogFormat;

/// Builds, signs and submits Teiki governance transactions.
#[derive(Parser, Debug)]
#[command(name = "teiki", about = "Teiki governance transactions", version, propagate_version = true)]
pub struct TeikiCli {
    /// Path to the CLI configuration file (TOML).
    #[arg(long, short = 'c', global = true, env = "TEIKI_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON ledger snapshot to read and update. Overrides the config file.
    #[arg(long, global = true, env = "TEIKI_LEDGER_STATE")]
    pub ledger_state: Option<PathBuf>,

    /// Hex-encoded ed25519 secret key of the paying wallet. Overrides the
    /// config file.
    #[arg(long, global = true, env = "TEIKI_WALLET_KEY", hide_env_values = true)]
    pub wallet_key: Option<String>,

    /// Log output format: pretty or json. Overrides the config file.
    #[arg(long, global = true, env = "TEIKI_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Lock lovelace behind a project at the backing validator.
    CreateBacking(CreateBackingArgs),
    /// Burn Teiki held by the wallet.
    BurnTeiki(TeikiArgs),
    /// Burn Teiki with the evolve redeemer.
    EvolveTeiki(TeikiArgs),
    /// Spend UTxOs held by the protocol script, signed by the governor.
    ReclaimProtocolScript(ReclaimArgs),
    /// Record a pending protocol params change.
    ProposeProtocolProposal(ProposeArgs),
    /// Apply the pending protocol params change.
    ApplyProtocolProposal(ApplyArgs),
    /// Clear the pending protocol params change.
    CancelProtocolProposal(CancelArgs),
    /// Print version information and exit.
    Version,
}

#[derive(Args, Debug)]
pub struct CreateBackingArgs {
    /// Project id, 32 bytes hex.
    #[arg(long)]
    pub project_id: Hash<32>,

    /// Lovelace to lock.
    #[arg(long)]
    pub amount: u64,

    /// Bech32 address of the backing validator.
    #[arg(long)]
    pub script_address: Address,

    /// POSIX milliseconds recorded in the datum. Defaults to the ledger
    /// clock, or 0 when it is unset.
    #[arg(long)]
    pub backed_at: Option<u64>,

    /// Milestone the project has reached.
    #[arg(long, default_value_t = 0)]
    pub milestone: u64,
}

#[derive(Args, Debug)]
pub struct TeikiArgs {
    /// UTxO carrying the Teiki minting policy as a reference script.
    #[arg(long)]
    pub policy_ref: OutRef,

    /// Teiki to burn.
    #[arg(long)]
    pub amount: u64,
}

#[derive(Args, Debug)]
pub struct ReclaimArgs {
    /// The protocol params UTxO.
    #[arg(long)]
    pub params: OutRef,

    /// UTxO carrying the protocol script as a reference script.
    #[arg(long)]
    pub script_ref: OutRef,

    /// UTxOs to reclaim. Repeat the flag for each one.
    #[arg(long = "reclaim", required = true)]
    pub reclaim: Vec<OutRef>,
}

#[derive(Args, Debug)]
pub struct ProposeArgs {
    /// The protocol proposal UTxO.
    #[arg(long)]
    pub proposal: OutRef,

    /// The protocol params UTxO the proposal is based on.
    #[arg(long)]
    pub params: OutRef,

    /// UTxO carrying the proposal validator as a reference script.
    #[arg(long)]
    pub script_ref: OutRef,

    /// The proposed params datum, hex-encoded Plutus data CBOR.
    #[arg(long)]
    pub proposed_params: String,

    /// POSIX milliseconds after which the proposal may be applied.
    #[arg(long)]
    pub in_effect_at: u64,
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// The protocol params UTxO.
    #[arg(long)]
    pub params: OutRef,

    /// The protocol proposal UTxO.
    #[arg(long)]
    pub proposal: OutRef,

    /// UTxO carrying the params validator as a reference script.
    #[arg(long)]
    pub params_script_ref: OutRef,

    /// UTxO carrying the proposal validator as a reference script.
    #[arg(long)]
    pub proposal_script_ref: OutRef,
}

#[derive(Args, Debug)]
pub struct CancelArgs {
    /// The protocol proposal UTxO.
    #[arg(long)]
    pub proposal: OutRef,

    /// The protocol params UTxO.
    #[arg(long)]
    pub params: OutRef,

    /// UTxO carrying the proposal validator as a reference script.
    #[arg(long)]
    pub script_ref: OutRef,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const TX: &str = "0101010101010101010101010101010101010101010101010101010101010101";

    #[test]
    fn verify_cli_structure() {
        TeikiCli::command().debug_assert();
    }

    #[test]
    fn test_parse_reclaim_with_repeated_refs() {
        let cli = TeikiCli::parse_from([
            "teiki".to_string(),
            "reclaim-protocol-script".to_string(),
            format!("--params={TX}#0"),
            format!("--script-ref={TX}#1"),
            format!("--reclaim={TX}#2"),
            format!("--reclaim={TX}#3"),
            "--log-format=json".to_string(),
        ]);
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        let Commands::ReclaimProtocolScript(args) = cli.command else {
            panic!("wrong subcommand");
        };
        assert_eq!(args.reclaim.len(), 2);
        assert_eq!(args.reclaim[1].index, 3);
        assert_eq!(args.params.to_string(), format!("{TX}#0"));
    }

    #[test]
    fn test_rejects_malformed_out_ref() {
        let result = TeikiCli::try_parse_from([
            "teiki",
            "burn-teiki",
            "--policy-ref",
            "not-an-out-ref",
            "--amount",
            "5",
        ]);
        assert!(result.is_err());
    }
}
