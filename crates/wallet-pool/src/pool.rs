use std::collections::HashMap;

use paywall_chain_solana::FeePayerSigner;
use solana_pubkey::Pubkey;

use crate::{
    error::{Error, Result},
    health::HealthMap,
    selection::RoundRobinSelector,
    wallet::{Wallet, WalletHealth},
};

/// The fixed set of sponsor / auto-create-ATA wallets, plus their current
/// health classification and round-robin cursor. Constructed once at
/// startup from a fixed keypair list — there is no dynamic add/remove in
/// this core; rotating the fleet means restarting with a new pool.
pub struct WalletPool {
    wallets: HashMap<Pubkey, Wallet>,
    selector: RoundRobinSelector,
    health: HealthMap,
}

impl WalletPool {
    pub fn new(wallets: Vec<Wallet>) -> Self {
        let pubkeys = wallets.iter().map(Wallet::pubkey).collect();
        let by_key = wallets.into_iter().map(|w| (w.pubkey(), w)).collect();
        Self {
            wallets: by_key,
            selector: RoundRobinSelector::new(pubkeys),
            health: HealthMap::new(),
        }
    }

    pub fn health(&self) -> &HealthMap {
        &self.health
    }

    pub fn pubkeys(&self) -> &[Pubkey] {
        self.selector.wallets()
    }

    pub fn get(&self, pubkey: &Pubkey) -> Option<&Wallet> {
        self.wallets.get(pubkey)
    }

    /// Selects the next healthy wallet round-robin. Never returns a wallet
    /// the health map doesn't currently consider [`WalletHealth::Healthy`]
    /// — callers must surface [`Error::NoHealthyWallet`] as a server-side
    /// failure rather than attempt the operation with an insolvent wallet.
    pub fn select_signer(&self) -> Result<&dyn FeePayerSigner> {
        let pubkey = self.selector.select_healthy(&self.health).ok_or(Error::NoHealthyWallet)?;
        let wallet = self.wallets.get(&pubkey).expect("selector only returns pool members");
        Ok(wallet as &dyn FeePayerSigner)
    }

    pub fn wallet_health(&self, pubkey: &Pubkey) -> Option<WalletHealth> {
        self.health.get(pubkey)
    }
}
