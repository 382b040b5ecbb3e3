//! A single-process, mutex-guarded [`Store`] implementation. It exists to
//! make the ledger's exactly-once contract testable without standing up a
//! real database, and is suitable for local development.

use std::{
    collections::HashMap,
    sync::RwLock,
};

use chrono::{DateTime, Utc};
use paywall_quote::{CartQuote, RefundQuote};
use paywall_store::{AdminNonce, Error, PaymentTransaction, Result, Store};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
pub struct MemoryStore {
    payments: RwLock<HashMap<String, PaymentTransaction>>,
    cart_quotes: RwLock<HashMap<String, CartQuote>>,
    refund_quotes: RwLock<HashMap<String, RefundQuote>>,
    nonces: RwLock<HashMap<String, AdminNonce>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn rlock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poison| poison.into_inner())
}

fn wlock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poison| poison.into_inner())
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn record_payment(&self, tx: PaymentTransaction, _cancel: &CancellationToken) -> Result<()> {
        let mut guard = wlock(&self.payments);
        match guard.get(&tx.signature) {
            Some(existing) if existing.is_sealed() => Err(Error::AlreadyUsed {
                original_resource_id: existing.resource_id.clone(),
            }),
            _ => {
                guard.insert(tx.signature.clone(), tx);
                Ok(())
            }
        }
    }

    async fn get_payment(&self, signature: &str, _cancel: &CancellationToken) -> Result<PaymentTransaction> {
        rlock(&self.payments).get(signature).cloned().ok_or(Error::NotFound)
    }

    async fn record_payments(&self, txs: Vec<PaymentTransaction>, _cancel: &CancellationToken) -> Result<()> {
        if txs.is_empty() {
            return Ok(());
        }

        let mut seen = std::collections::HashSet::new();
        for tx in &txs {
            if !seen.insert(tx.signature.clone()) {
                return Err(Error::AlreadyUsed {
                    original_resource_id: tx.resource_id.clone(),
                });
            }
        }

        let mut guard = wlock(&self.payments);
        for tx in &txs {
            if let Some(existing) = guard.get(&tx.signature) {
                if existing.is_sealed() {
                    return Err(Error::AlreadyUsed {
                        original_resource_id: existing.resource_id.clone(),
                    });
                }
            }
        }

        for tx in txs {
            guard.insert(tx.signature.clone(), tx);
        }
        Ok(())
    }

    async fn save_cart_quote(&self, cart: CartQuote, _cancel: &CancellationToken) -> Result<()> {
        wlock(&self.cart_quotes).insert(cart.id.clone(), cart);
        Ok(())
    }

    async fn get_cart_quote(&self, id: &str, now: DateTime<Utc>, _cancel: &CancellationToken) -> Result<CartQuote> {
        let cart = rlock(&self.cart_quotes).get(id).cloned().ok_or(Error::NotFound)?;
        if cart.is_expired(now) {
            return Err(Error::CartExpired);
        }
        Ok(cart)
    }

    async fn save_cart_quotes(&self, carts: Vec<CartQuote>, _cancel: &CancellationToken) -> Result<()> {
        for cart in &carts {
            if cart.id.is_empty() {
                return Err(Error::InvalidBatch("cart quote id must not be empty".to_owned()));
            }
        }
        let mut guard = wlock(&self.cart_quotes);
        for cart in carts {
            guard.insert(cart.id.clone(), cart);
        }
        Ok(())
    }

    async fn create_refund_quote(&self, refund: RefundQuote, _cancel: &CancellationToken) -> Result<()> {
        let mut guard = wlock(&self.refund_quotes);
        if guard.contains_key(&refund.id) {
            return Err(Error::RefundAlreadyExists(refund.id));
        }
        guard.insert(refund.id.clone(), refund);
        Ok(())
    }

    async fn save_refund_quote(&self, refund: RefundQuote, _cancel: &CancellationToken) -> Result<()> {
        wlock(&self.refund_quotes).insert(refund.id.clone(), refund);
        Ok(())
    }

    async fn get_refund_quote(&self, id: &str, _cancel: &CancellationToken) -> Result<RefundQuote> {
        rlock(&self.refund_quotes).get(id).cloned().ok_or(Error::NotFound)
    }

    async fn save_refund_quotes(&self, refunds: Vec<RefundQuote>, _cancel: &CancellationToken) -> Result<()> {
        for refund in &refunds {
            if refund.id.is_empty() {
                return Err(Error::InvalidBatch("refund quote id must not be empty".to_owned()));
            }
        }
        let mut guard = wlock(&self.refund_quotes);
        for refund in refunds {
            guard.insert(refund.id.clone(), refund);
        }
        Ok(())
    }

    async fn deny_refund_quote(&self, id: &str, _cancel: &CancellationToken) -> Result<()> {
        let mut guard = wlock(&self.refund_quotes);
        match guard.get(id) {
            None => Err(Error::NotFound),
            Some(refund) if refund.is_sealed() => Err(Error::CannotDenySealedRefund(id.to_owned())),
            Some(_) => {
                guard.remove(id);
                Ok(())
            }
        }
    }

    async fn create_nonce(&self, nonce: AdminNonce, _cancel: &CancellationToken) -> Result<()> {
        let mut guard = wlock(&self.nonces);
        if guard.contains_key(&nonce.id) {
            return Err(Error::NonceAlreadyExists(nonce.id));
        }
        guard.insert(nonce.id.clone(), nonce);
        Ok(())
    }

    async fn consume_nonce(&self, id: &str, now: DateTime<Utc>, _cancel: &CancellationToken) -> Result<()> {
        let mut guard = wlock(&self.nonces);
        let nonce = guard.get_mut(id).ok_or(Error::NotFound)?;
        if nonce.is_consumed() {
            return Err(Error::NonceNotConsumable {
                id: id.to_owned(),
                reason: "already consumed",
            });
        }
        if nonce.is_expired(now) {
            return Err(Error::NonceNotConsumable {
                id: id.to_owned(),
                reason: "expired",
            });
        }
        nonce.consumed_at = Some(now);
        Ok(())
    }

    async fn archive_old_payments(&self, cutoff: DateTime<Utc>, _cancel: &CancellationToken) -> Result<u64> {
        let mut guard = wlock(&self.payments);
        let before = guard.len();
        guard.retain(|_, tx| tx.created_at >= cutoff);
        Ok(u64::try_from(before - guard.len()).unwrap_or(u64::MAX))
    }

    async fn cleanup_expired_nonces(&self, now: DateTime<Utc>, _cancel: &CancellationToken) -> Result<u64> {
        let mut guard = wlock(&self.nonces);
        let before = guard.len();
        guard.retain(|_, nonce| !nonce.is_expired(now));
        Ok(u64::try_from(before - guard.len()).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use chrono::{Duration, TimeZone};
    use paywall_money::{Asset, AssetCategory, AssetMetadata, Money};
    use paywall_store::PaymentStatus;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn usdc_money(atomic: i64) -> Money {
        let asset = Asset::new(
            "USDC",
            6,
            AssetCategory::OnChainToken,
            AssetMetadata::OnChainToken {
                mint_address: "EPjFW...".to_owned(),
            },
        )
        .unwrap();
        Money::from_atomic(asset, atomic)
    }

    fn placeholder(signature: &str, resource_id: &str) -> PaymentTransaction {
        PaymentTransaction {
            signature: signature.to_owned(),
            resource_id: resource_id.to_owned(),
            wallet: String::new(),
            amount: usdc_money(0),
            created_at: now(),
            status: PaymentStatus::Verifying,
            metadata: HashMap::new(),
        }
    }

    fn sealed(signature: &str, resource_id: &str) -> PaymentTransaction {
        PaymentTransaction {
            signature: signature.to_owned(),
            resource_id: resource_id.to_owned(),
            wallet: "wallet-1".to_owned(),
            amount: usdc_money(1_000_000),
            created_at: now(),
            status: PaymentStatus::Verified,
            metadata: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn placeholder_can_be_upgraded_to_sealed() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        store.record_payment(placeholder("sig1", "res_a"), &cancel).await.unwrap();
        store.record_payment(sealed("sig1", "res_a"), &cancel).await.unwrap();

        let row = store.get_payment("sig1", &cancel).await.unwrap();
        assert!(row.is_sealed());
    }

    #[tokio::test]
    async fn sealed_row_cannot_be_overwritten() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        store.record_payment(sealed("sig1", "res_a"), &cancel).await.unwrap();

        let err = store.record_payment(sealed("sig1", "res_b"), &cancel).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyUsed { original_resource_id } if original_resource_id == "res_a"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_record_payment_is_exactly_once() {
        let store = Arc::new(MemoryStore::new());
        let barrier = Arc::new(tokio::sync::Barrier::new(8));
        let mut handles = Vec::new();

        for i in 0..8 {
            let store = store.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                let cancel = CancellationToken::new();
                store.record_payment(sealed("shared-sig", &format!("res_{i}")), &cancel).await
            }));
        }

        let mut successes = 0;
        let mut already_used = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => successes += 1,
                Err(Error::AlreadyUsed { .. }) => already_used += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        // Every racer targets a Verified (sealed) row, so only the first
        // writer observes "no existing row"; every later writer must see a
        // sealed row and fail, even though all eight raced the same mutex.
        assert_eq!(successes, 1);
        assert_eq!(already_used, 7);
    }

    #[tokio::test]
    async fn get_cart_quote_reports_expiry() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let cart = CartQuote {
            id: "cart_1".to_owned(),
            items: vec![],
            total: usdc_money(0),
            metadata: HashMap::new(),
            created_at: now(),
            expires_at: now() + Duration::minutes(10),
            paid_by: None,
        };
        store.save_cart_quote(cart, &cancel).await.unwrap();

        assert!(store.get_cart_quote("cart_1", now(), &cancel).await.is_ok());
        let err = store
            .get_cart_quote("cart_1", now() + Duration::hours(1), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CartExpired));
    }

    #[tokio::test]
    async fn create_refund_quote_rejects_a_duplicate_id() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let refund = RefundQuote {
            id: "refund_sig1".to_owned(),
            original_signature: "sig1".to_owned(),
            recipient_wallet: "customer".to_owned(),
            amount: usdc_money(500_000),
            reason: None,
            metadata: HashMap::new(),
            created_at: now(),
            expires_at: now() + Duration::minutes(10),
            processed_by: None,
            processed_at: None,
            executing_signature: None,
        };
        store.create_refund_quote(refund.clone(), &cancel).await.unwrap();

        let err = store.create_refund_quote(refund, &cancel).await.unwrap_err();
        assert!(matches!(err, Error::RefundAlreadyExists(id) if id == "refund_sig1"));
    }

    #[tokio::test]
    async fn consume_nonce_rejects_double_consumption() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        store
            .create_nonce(
                AdminNonce {
                    id: "nonce_1".to_owned(),
                    purpose: "refund".to_owned(),
                    created_at: now(),
                    expires_at: now() + Duration::minutes(5),
                    consumed_at: None,
                },
                &cancel,
            )
            .await
            .unwrap();

        store.consume_nonce("nonce_1", now(), &cancel).await.unwrap();
        let err = store.consume_nonce("nonce_1", now(), &cancel).await.unwrap_err();
        assert!(matches!(err, Error::NonceNotConsumable { reason: "already consumed", .. }));
    }

    #[tokio::test]
    async fn archive_old_payments_counts_removed_rows() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        store.record_payment(sealed("old", "res_a"), &cancel).await.unwrap();

        let removed = store.archive_old_payments(now() + Duration::days(1), &cancel).await.unwrap();
        assert_eq!(removed, 1);
        assert!(matches!(store.get_payment("old", &cancel).await, Err(Error::NotFound)));
    }
}
