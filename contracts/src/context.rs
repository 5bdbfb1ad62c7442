//! Per-deployment settings shared by every action.

use teiki_protocol::config::{network_name, TEIKI_TOKEN_NAME};
use teiki_protocol::ledger::{resolve_unit, AssetName, AssetUnit, Script};
use teiki_protocol::transaction::TxBuilder;

/// What an action needs to know about the deployment it builds for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolContext {
    pub network_id: u8,
    /// Token name under the Teiki minting policy.
    pub token_name: AssetName,
}

impl ProtocolContext {
    /// Context for `network_id` with the standard Teiki token name.
    pub fn new(network_id: u8) -> Self {
        Self {
            network_id,
            token_name: AssetName::new(TEIKI_TOKEN_NAME).expect("static token name is valid"),
        }
    }

    /// A fresh, empty transaction description.
    pub fn new_tx(&self) -> TxBuilder {
        TxBuilder::new()
    }

    /// The Teiki unit minted by `policy`.
    pub fn teiki_unit(&self, policy: &Script) -> AssetUnit {
        resolve_unit(&policy.hash(), &self.token_name)
    }

    pub fn network(&self) -> String {
        network_name(self.network_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teiki_protocol::config::NETWORK_ID_TESTNET;

    #[test]
    fn test_teiki_unit_follows_policy() {
        let ctx = ProtocolContext::new(NETWORK_ID_TESTNET);
        let a = Script::minting_policy(vec![1]);
        let b = Script::minting_policy(vec![2]);
        assert_eq!(ctx.teiki_unit(&a), ctx.teiki_unit(&a));
        assert_ne!(ctx.teiki_unit(&a), ctx.teiki_unit(&b));
        assert!(ctx.teiki_unit(&a).to_string().ends_with(&hex_teiki()));
        assert_eq!(ctx.network(), "testnet");
    }

    fn hex_teiki() -> String {
        hex::encode(TEIKI_TOKEN_NAME)
    }
}
