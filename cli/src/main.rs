// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Teiki CLI
//!
//! Entry point for the `teiki` binary. Parses arguments, merges them over
//! the TOML configuration, initializes logging, and runs one governance
//! action against the ledger state file.
//!
//! On success the transaction id is the only thing written to stdout.
//! Errors go to stderr with their full context chain and exit non-zero.

mod cli;
mod commands;
mod config;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;

use teiki_protocol::crypto::keys::WalletKey;

use cli::{Commands, TeikiCli};
use commands::Session;
use config::CliConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = TeikiCli::parse();

    if let Commands::Version = cli.command {
        print_version();
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => CliConfig::from_toml_file(path)?,
        None => CliConfig::default(),
    };
    if let Some(path) = cli.ledger_state {
        config.ledger_state = path;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(key) = cli.wallet_key {
        config.wallet_key = Some(key);
    }

    logging::init_logging(logging::DEFAULT_DIRECTIVE, config.log_format);

    let key_hex = config
        .wallet_key
        .as_deref()
        .context("no wallet key: pass --wallet-key or set wallet_key in the config file")?;
    let key = WalletKey::from_hex(key_hex).context("invalid wallet key")?;

    let session = Session::open(&config, key)?;
    let tx_id = commands::execute(&session, cli.command).await?;
    println!("{}", tx_id);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("teiki {}", env!("CARGO_PKG_VERSION"));
    println!("token {}", String::from_utf8_lossy(teiki_protocol::config::TEIKI_TOKEN_NAME));
}
