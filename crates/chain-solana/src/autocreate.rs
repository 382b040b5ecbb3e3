use std::time::Duration;

use solana_pubkey::Pubkey;
use solana_signature::Signature;
use tokio_util::sync::CancellationToken;

use crate::{
    confirm::ChainClient,
    error::{Error, Result},
};

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(2);
const MAX_ATTEMPTS: u32 = 30;

/// Minimal signing capability the auto-create path needs from a wallet-pool
/// entry, without this crate depending on `paywall-wallet-pool` directly.
pub trait FeePayerSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;
}

/// Associated-token-account auto-create retry, per the recipient-account-
/// missing branch: submit a creation transaction paid for by `fee_payer`,
/// then poll existence with exponential backoff (500ms doubling to a 2s
/// cap) up to 30 attempts before giving up.
pub async fn auto_create_token_account(
    client: &dyn ChainClient,
    fee_payer: &dyn FeePayerSigner,
    owner: &Pubkey,
    mint: &Pubkey,
    cancel: &CancellationToken,
) -> Result<Signature> {
    let signature = client.create_associated_token_account(fee_payer, owner, mint).await?;

    let expected = spl_associated_token_account::get_associated_token_address(owner, mint);
    let mut backoff = INITIAL_BACKOFF;
    for attempt in 0..MAX_ATTEMPTS {
        if attempt > 0 {
            tokio::select! {
                () = tokio::time::sleep(backoff) => {}
                () = cancel.cancelled() => return Err(Error::TransactionFailed),
            }
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
        if client.account_exists(&expected).await? {
            return Ok(signature);
        }
    }

    Err(Error::TransactionFailed)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use solana_commitment_config::CommitmentConfig;
    use solana_transaction::Transaction;

    use super::*;
    use crate::confirm::ConfirmationStatus;

    struct StubSigner(Pubkey);

    impl FeePayerSigner for StubSigner {
        fn pubkey(&self) -> Pubkey {
            self.0
        }
    }

    struct EventualClient {
        exists_after: u32,
        calls: AtomicU32,
    }

    #[async_trait::async_trait]
    impl ChainClient for EventualClient {
        async fn send_transaction(&self, _tx: &Transaction, _skip_preflight: bool) -> Result<Signature> {
            unimplemented!("not exercised")
        }

        async fn get_signature_status(&self, _signature: &Signature, _commitment: CommitmentConfig) -> Result<ConfirmationStatus> {
            unimplemented!("not exercised")
        }

        async fn account_exists(&self, _pubkey: &Pubkey) -> Result<bool> {
            let calls = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(calls >= self.exists_after)
        }

        async fn create_associated_token_account(
            &self,
            _fee_payer: &dyn FeePayerSigner,
            _owner: &Pubkey,
            _mint: &Pubkey,
        ) -> Result<Signature> {
            Ok(Signature::default())
        }

        async fn broadcast_sponsored(
            &self,
            _tx: &Transaction,
            _fee_payer: &dyn FeePayerSigner,
            _skip_preflight: bool,
        ) -> Result<Signature> {
            unimplemented!("not exercised")
        }
    }

    #[tokio::test]
    async fn succeeds_once_account_appears() {
        let client = EventualClient {
            exists_after: 2,
            calls: AtomicU32::new(0),
        };
        let signer = StubSigner(Pubkey::default());
        let cancel = CancellationToken::new();
        let result = auto_create_token_account(&client, &signer, &Pubkey::default(), &Pubkey::default(), &cancel).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn cancellation_aborts_the_poll() {
        let client = EventualClient {
            exists_after: u32::MAX,
            calls: AtomicU32::new(0),
        };
        let signer = StubSigner(Pubkey::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = auto_create_token_account(&client, &signer, &Pubkey::default(), &Pubkey::default(), &cancel).await;
        assert!(result.is_err());
    }
}
