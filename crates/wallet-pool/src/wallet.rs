use paywall_chain_solana::FeePayerSigner;
use solana_keypair::Keypair;
use solana_pubkey::Pubkey;
use solana_signer::Signer as _;

/// One sponsor/auto-create wallet held by the pool, keyed by its public
/// key. The pool never exposes the keypair outside this module; callers
/// that need to sign (the fee-sponsorship and auto-create-ATA paths in
/// `paywall-chain-solana`) receive it only behind the narrow
/// [`FeePayerSigner`] trait object.
pub struct Wallet {
    keypair: Keypair,
}

impl Wallet {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }
}

impl FeePayerSigner for Wallet {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }
}

/// Classification bucket a wallet falls into based on its native-token
/// balance, per [`crate::health::HealthThresholds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletHealth {
    Healthy,
    Low,
    Critical,
}

impl WalletHealth {
    pub fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }
}
