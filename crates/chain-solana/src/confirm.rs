use std::time::{Duration, Instant};

use solana_commitment_config::CommitmentConfig;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction::Transaction;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// The conservative upper bound on blockhash validity — confirmation
/// polling gives up once this much wall-clock time has elapsed, regardless
/// of what `quote_ttl` says, since the blockhash itself will have expired
/// on-chain by then.
pub const BLOCKHASH_VALIDITY: Duration = Duration::from_secs(90);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    Pending,
    Confirmed,
    Failed(String),
}

/// The RPC-facing surface the verifier needs: broadcast, poll status, and
/// check whether an account exists (used by the auto-create-ATA retry).
/// Concrete implementations wrap a real RPC client; tests use an in-memory
/// fake.
#[async_trait::async_trait]
pub trait ChainClient: Send + Sync {
    async fn send_transaction(&self, tx: &Transaction, skip_preflight: bool) -> Result<Signature>;
    async fn get_signature_status(&self, signature: &Signature, commitment: CommitmentConfig) -> Result<ConfirmationStatus>;
    async fn account_exists(&self, pubkey: &Pubkey) -> Result<bool>;

    /// Submits an associated-token-account creation transaction paid for by
    /// `fee_payer`. Transaction assembly (blockhash fetch, message/signature
    /// construction) is the concrete client's concern; this trait only
    /// needs the resulting broadcast signature.
    async fn create_associated_token_account(
        &self,
        fee_payer: &dyn crate::autocreate::FeePayerSigner,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Signature>;

    /// Co-signs `tx` as `fee_payer` and broadcasts it. Used for sponsored
    /// payments, where the client's signature alone is not a complete
    /// transaction.
    async fn broadcast_sponsored(
        &self,
        tx: &Transaction,
        fee_payer: &dyn crate::autocreate::FeePayerSigner,
        skip_preflight: bool,
    ) -> Result<Signature>;
}

/// The push-subscription confirmation transport. Kept separate from
/// [`ChainClient`] because a subscription-capable websocket client is a
/// distinct collaborator from the plain RPC client, and the primary
/// confirmation path degrades to RPC polling whenever this one fails.
#[async_trait::async_trait]
pub trait ConfirmationSubscriber: Send + Sync {
    async fn subscribe_until_commitment(&self, signature: &Signature, commitment: CommitmentConfig) -> Result<ConfirmationStatus>;
}

/// Awaits confirmation to `commitment`, preferring the push-subscription
/// transport when given one and falling back to RPC polling on any
/// subscription failure or when none is configured. A not-yet-confirmed
/// status is distinguished from a real failure and simply causes another
/// poll, up to [`BLOCKHASH_VALIDITY`].
pub async fn await_confirmation(
    client: &dyn ChainClient,
    subscriber: Option<&dyn ConfirmationSubscriber>,
    signature: &Signature,
    commitment: CommitmentConfig,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> Result<()> {
    if let Some(subscriber) = subscriber {
        match subscriber.subscribe_until_commitment(signature, commitment).await {
            Ok(ConfirmationStatus::Confirmed) => return Ok(()),
            Ok(ConfirmationStatus::Failed(reason)) => {
                tracing::warn!(reason, "on-chain transaction failed during push confirmation");
                return Err(Error::TransactionFailed);
            }
            Ok(ConfirmationStatus::Pending) => {}
            Err(error) => {
                tracing::warn!(%error, "push confirmation subscription failed, falling back to RPC polling");
            }
        }
    }

    let deadline = Instant::now() + BLOCKHASH_VALIDITY;
    loop {
        if cancel.is_cancelled() {
            return Err(Error::TransactionFailed);
        }
        if Instant::now() >= deadline {
            return Err(Error::TransactionFailed);
        }

        match client.get_signature_status(signature, commitment).await? {
            ConfirmationStatus::Confirmed => return Ok(()),
            ConfirmationStatus::Failed(reason) => {
                tracing::warn!(reason, "on-chain transaction failed during RPC polling");
                return Err(Error::TransactionFailed);
            }
            ConfirmationStatus::Pending => {
                tokio::select! {
                    () = tokio::time::sleep(poll_interval) => {}
                    () = cancel.cancelled() => return Err(Error::TransactionFailed),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    struct ScriptedClient {
        statuses: Mutex<Vec<ConfirmationStatus>>,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ChainClient for ScriptedClient {
        async fn send_transaction(&self, _tx: &Transaction, _skip_preflight: bool) -> Result<Signature> {
            unimplemented!("not exercised in confirmation tests")
        }

        async fn get_signature_status(&self, _signature: &Signature, _commitment: CommitmentConfig) -> Result<ConfirmationStatus> {
            let idx = self.calls.fetch_add(1, Ordering::SeqCst);
            let guard = self.statuses.lock().unwrap();
            Ok(guard.get(idx).cloned().unwrap_or(ConfirmationStatus::Pending))
        }

        async fn account_exists(&self, _pubkey: &Pubkey) -> Result<bool> {
            Ok(true)
        }

        async fn create_associated_token_account(
            &self,
            _fee_payer: &dyn crate::autocreate::FeePayerSigner,
            _owner: &Pubkey,
            _mint: &Pubkey,
        ) -> Result<Signature> {
            unimplemented!("not exercised in confirmation tests")
        }

        async fn broadcast_sponsored(
            &self,
            _tx: &Transaction,
            _fee_payer: &dyn crate::autocreate::FeePayerSigner,
            _skip_preflight: bool,
        ) -> Result<Signature> {
            unimplemented!("not exercised in confirmation tests")
        }
    }

    fn dummy_signature() -> Signature {
        Signature::default()
    }

    #[tokio::test]
    async fn polls_until_confirmed() {
        let client = ScriptedClient {
            statuses: Mutex::new(vec![ConfirmationStatus::Pending, ConfirmationStatus::Confirmed]),
            calls: AtomicUsize::new(0),
        };
        let cancel = CancellationToken::new();
        let result = await_confirmation(
            &client,
            None,
            &dummy_signature(),
            CommitmentConfig::confirmed(),
            Duration::from_millis(1),
            &cancel,
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn failed_status_is_distinguished_from_pending() {
        let client = ScriptedClient {
            statuses: Mutex::new(vec![ConfirmationStatus::Failed("InstructionError".to_owned())]),
            calls: AtomicUsize::new(0),
        };
        let cancel = CancellationToken::new();
        let result = await_confirmation(
            &client,
            None,
            &dummy_signature(),
            CommitmentConfig::confirmed(),
            Duration::from_millis(1),
            &cancel,
        )
        .await;
        assert!(matches!(result, Err(Error::TransactionFailed)));
    }

    #[tokio::test]
    async fn cancellation_aborts_the_wait() {
        let client = ScriptedClient {
            statuses: Mutex::new(vec![]),
            calls: AtomicUsize::new(0),
        };
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = await_confirmation(
            &client,
            None,
            &dummy_signature(),
            CommitmentConfig::confirmed(),
            Duration::from_secs(1),
            &cancel,
        )
        .await;
        assert!(result.is_err());
    }
}
