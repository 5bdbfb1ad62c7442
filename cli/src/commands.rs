//! Command execution.
//!
//! Every action command runs the same pipeline: resolve the named UTxOs,
//! call the action, add the wallet's UTxOs to pay the fee, finalize, sign,
//! submit, wait for confirmation and persist the ledger.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use tracing::info;

use teiki_contracts::{
    apply_protocol_proposal, burn_teiki, cancel_protocol_proposal, create_backing, evolve_teiki,
    propose_protocol_proposal, reclaim_protocol_script, BackingDatum, ProtocolContext,
    ProtocolParamsDatum,
};
use teiki_protocol::crypto::hash::TxHash;
use teiki_protocol::crypto::keys::WalletKey;
use teiki_protocol::data::from_cbor;
use teiki_protocol::ledger::{
    Address, Emulator, LedgerClient, LedgerError, LedgerSnapshot, OutRef, Utxo,
};
use teiki_protocol::TxBuilder;

use crate::cli::Commands;
use crate::config::CliConfig;

/// A loaded ledger plus the wallet acting on it.
pub struct Session {
    ledger: Emulator,
    ctx: ProtocolContext,
    wallet: Address,
    state_path: PathBuf,
}

impl Session {
    /// Loads the ledger named by `config` and unlocks `key` on it.
    pub fn open(config: &CliConfig, key: WalletKey) -> Result<Self> {
        let path = &config.ledger_state;
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read ledger state {}", path.display()))?;
        let mut snapshot = LedgerSnapshot::from_json(&json)
            .with_context(|| format!("invalid ledger state {}", path.display()))?;
        if let Some(params) = config.ledger {
            snapshot.params = params;
        }

        let wallet = Address::from_key_hash(config.network_id, key.key_hash());
        info!(
            ledger = %path.display(),
            utxos = snapshot.utxos.len(),
            wallet = %wallet,
            "session opened"
        );
        Ok(Self {
            ledger: Emulator::from_snapshot(snapshot, vec![key]),
            ctx: ProtocolContext::new(config.network_id),
            wallet,
            state_path: path.clone(),
        })
    }

    #[cfg(test)]
    pub fn ledger(&self) -> &Emulator {
        &self.ledger
    }

    async fn resolve(&self, out_ref: &OutRef) -> Result<Utxo> {
        self.ledger
            .resolve_utxo(out_ref)
            .await
            .with_context(|| format!("failed to resolve {}", out_ref))
    }

    /// Resolves every ref, failing on the first one the ledger lacks.
    async fn resolve_all(&self, refs: &[OutRef]) -> Result<Vec<Utxo>> {
        let utxos = self.ledger.resolve_utxos(refs).await?;
        if let Some(missing) = refs
            .iter()
            .find(|r| !utxos.iter().any(|u| u.out_ref == **r))
        {
            return Err(LedgerError::NotFound(missing.to_string()))
                .with_context(|| format!("failed to resolve {}", missing));
        }
        Ok(utxos)
    }

    /// Funds `builder` from the wallet, then finalizes, signs, submits and
    /// persists.
    async fn submit(&self, builder: TxBuilder) -> Result<TxHash> {
        let funding = self.ledger.utxos_at(&self.wallet);
        if funding.is_empty() {
            bail!("wallet {} holds no UTxOs to pay the fee", self.wallet);
        }
        let builder = builder
            .collect_from(funding, None)
            .change_address(self.wallet);

        let tx = self
            .ledger
            .finalize(builder)
            .await
            .context("failed to finalize transaction")?;
        let fee = tx.fee();
        let tx_id = self
            .ledger
            .sign_and_submit(tx)
            .await
            .context("transaction rejected")?;
        self.ledger.await_confirmation(&tx_id).await?;
        self.ledger
            .save(&self.state_path)
            .with_context(|| format!("failed to save {}", self.state_path.display()))?;

        info!(tx_id = %tx_id, fee, "transaction confirmed");
        Ok(tx_id)
    }
}

/// Runs an action command and returns the id of the submitted transaction.
pub async fn execute(session: &Session, command: Commands) -> Result<TxHash> {
    let ctx = &session.ctx;
    let builder = match command {
        Commands::CreateBacking(args) => {
            let datum = BackingDatum {
                project_id: args.project_id,
                backer_address: session.wallet.to_plutus(),
                backed_at: args
                    .backed_at
                    .or(session.ledger.snapshot().time_ms)
                    .unwrap_or_default(),
                milestone_backed: args.milestone,
            };
            let inputs = session.ledger.utxos_at(&session.wallet);
            create_backing(ctx, &datum, args.amount, args.script_address, inputs)?
        }
        Commands::BurnTeiki(args) => {
            let policy = session.resolve(&args.policy_ref).await?;
            burn_teiki(ctx, &policy, args.amount)?
        }
        Commands::EvolveTeiki(args) => {
            let policy = session.resolve(&args.policy_ref).await?;
            evolve_teiki(ctx, &policy, args.amount)?
        }
        Commands::ReclaimProtocolScript(args) => {
            let params = session.resolve(&args.params).await?;
            let script_ref = session.resolve(&args.script_ref).await?;
            let reclaim = session.resolve_all(&args.reclaim).await?;
            reclaim_protocol_script(ctx, &params, reclaim, &script_ref)?
        }
        Commands::ProposeProtocolProposal(args) => {
            let bytes = hex::decode(args.proposed_params.trim())
                .context("proposed params are not valid hex")?;
            let proposed: ProtocolParamsDatum =
                from_cbor(&bytes).context("proposed params are not a params datum")?;
            let proposal = session.resolve(&args.proposal).await?;
            let params = session.resolve(&args.params).await?;
            let script_ref = session.resolve(&args.script_ref).await?;
            propose_protocol_proposal(
                ctx,
                &proposal,
                &params,
                &script_ref,
                proposed,
                args.in_effect_at,
            )?
        }
        Commands::ApplyProtocolProposal(args) => {
            let params = session.resolve(&args.params).await?;
            let proposal = session.resolve(&args.proposal).await?;
            let scripts = [
                session.resolve(&args.params_script_ref).await?,
                session.resolve(&args.proposal_script_ref).await?,
            ];
            apply_protocol_proposal(ctx, &params, &proposal, scripts)?
        }
        Commands::CancelProtocolProposal(args) => {
            let proposal = session.resolve(&args.proposal).await?;
            let params = session.resolve(&args.params).await?;
            let script_ref = session.resolve(&args.script_ref).await?;
            cancel_protocol_proposal(ctx, &proposal, &params, &script_ref)?
        }
        Commands::Version => return Err(anyhow!("version is not a transaction command")),
    };
    session.submit(builder).await
}
