use std::{
    collections::HashMap,
    sync::{
        Mutex, RwLock,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use paywall_authorize::{CouponRepository, Error, Observability, ProductRepository, Result, SubscriptionChecker};
use paywall_chain_solana::{ChainClient, ConfirmationStatus, ConfirmationSubscriber, FeePayerSigner};
use paywall_coupon::{Coupon, PaymentMethod};
use paywall_quote::ResourceDefinition;
use solana_commitment_config::CommitmentConfig;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction::Transaction;

/// An in-memory [`ProductRepository`] fixture, seeded with a fixed catalog.
#[derive(Default)]
pub struct FakeProductRepository {
    by_id: HashMap<String, ResourceDefinition>,
}

impl FakeProductRepository {
    pub fn new(products: Vec<ResourceDefinition>) -> Self {
        Self {
            by_id: products.into_iter().map(|p| (p.resource_id.clone(), p)).collect(),
        }
    }
}

#[async_trait]
impl ProductRepository for FakeProductRepository {
    async fn get_product(&self, resource_id: &str) -> Result<ResourceDefinition> {
        self.by_id.get(resource_id).cloned().ok_or_else(|| Error::UnknownResource(resource_id.to_owned()))
    }

    async fn get_product_by_external_price_id(&self, external_price_id: &str) -> Result<ResourceDefinition> {
        self.by_id
            .values()
            .find(|product| product.fiat_price.as_ref().is_some_and(|fiat| fiat.external_price_id == external_price_id))
            .cloned()
            .ok_or_else(|| Error::UnknownResource(external_price_id.to_owned()))
    }

    async fn list_products(&self) -> Result<Vec<ResourceDefinition>> {
        Ok(self.by_id.values().cloned().collect())
    }
}

/// An in-memory [`CouponRepository`] fixture. `increment_usage` actually
/// mutates the stored coupon's `usage_count`, so tests can assert on the
/// best-effort consumption path rather than just that it didn't error.
#[derive(Default)]
pub struct FakeCouponRepository {
    by_code: RwLock<HashMap<String, Coupon>>,
}

impl FakeCouponRepository {
    pub fn new(coupons: Vec<Coupon>) -> Self {
        Self {
            by_code: RwLock::new(coupons.into_iter().map(|coupon| (coupon.code.clone(), coupon)).collect()),
        }
    }

    pub fn usage_count(&self, code: &str) -> Option<u64> {
        self.by_code.read().unwrap_or_else(|e| e.into_inner()).get(code).map(|coupon| coupon.usage_count)
    }
}

#[async_trait]
impl CouponRepository for FakeCouponRepository {
    async fn get_coupon(&self, code: &str) -> Result<Option<Coupon>> {
        Ok(self.by_code.read().unwrap_or_else(|e| e.into_inner()).get(code).cloned())
    }

    async fn get_auto_apply_coupons(&self, product_id: &str, method: PaymentMethod) -> Result<Vec<Coupon>> {
        Ok(self
            .by_code
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|coupon| coupon.applies_to_product(product_id) && coupon.applies_to_method(method) && !coupon.is_exhausted())
            .cloned()
            .collect())
    }

    async fn increment_usage(&self, code: &str) -> Result<()> {
        if let Some(coupon) = self.by_code.write().unwrap_or_else(|e| e.into_inner()).get_mut(code) {
            coupon.usage_count += 1;
        }
        Ok(())
    }
}

/// A [`SubscriptionChecker`] fixture that grants access to a fixed
/// allowlist of `(wallet, product_id)` pairs.
#[derive(Default)]
pub struct FakeSubscriptionChecker {
    allow: Mutex<Vec<(String, String)>>,
}

impl FakeSubscriptionChecker {
    pub fn new(allow: Vec<(String, String)>) -> Self {
        Self { allow: Mutex::new(allow) }
    }
}

#[async_trait]
impl SubscriptionChecker for FakeSubscriptionChecker {
    async fn has_access(&self, wallet: &str, product: &str) -> Result<bool> {
        Ok(self
            .allow
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|(w, p)| w == wallet && p == product))
    }
}

/// A [`ChainClient`] fixture that always reports success: accounts exist,
/// broadcasts return a fixed signature, and confirmation is immediate.
/// Scripted failures are better served by a bespoke fake in the consuming
/// test; this one exists for the common "everything works" path.
pub struct AlwaysConfirmedChainClient {
    pub signature: Signature,
}

impl Default for AlwaysConfirmedChainClient {
    fn default() -> Self {
        Self {
            signature: Signature::default(),
        }
    }
}

#[async_trait]
impl ChainClient for AlwaysConfirmedChainClient {
    async fn send_transaction(&self, _tx: &Transaction, _skip_preflight: bool) -> paywall_chain_solana::Result<Signature> {
        Ok(self.signature)
    }

    async fn get_signature_status(
        &self,
        _signature: &Signature,
        _commitment: CommitmentConfig,
    ) -> paywall_chain_solana::Result<ConfirmationStatus> {
        Ok(ConfirmationStatus::Confirmed)
    }

    async fn account_exists(&self, _pubkey: &Pubkey) -> paywall_chain_solana::Result<bool> {
        Ok(true)
    }

    async fn create_associated_token_account(
        &self,
        _fee_payer: &dyn FeePayerSigner,
        _owner: &Pubkey,
        _mint: &Pubkey,
    ) -> paywall_chain_solana::Result<Signature> {
        Ok(self.signature)
    }

    async fn broadcast_sponsored(
        &self,
        _tx: &Transaction,
        _fee_payer: &dyn FeePayerSigner,
        _skip_preflight: bool,
    ) -> paywall_chain_solana::Result<Signature> {
        Ok(self.signature)
    }
}

/// A [`ConfirmationSubscriber`] fixture that immediately reports the
/// configured status, so tests don't fall through to RPC-poll timing.
pub struct ImmediateConfirmationSubscriber(pub ConfirmationStatus);

#[async_trait]
impl ConfirmationSubscriber for ImmediateConfirmationSubscriber {
    async fn subscribe_until_commitment(
        &self,
        _signature: &Signature,
        _commitment: CommitmentConfig,
    ) -> paywall_chain_solana::Result<ConfirmationStatus> {
        Ok(self.0.clone())
    }
}

/// A [`paywall_wallet_pool::NativeBalanceProvider`] fixture returning a
/// fixed balance for every wallet.
pub struct FixedBalanceProvider(pub f64);

#[async_trait]
impl paywall_wallet_pool::NativeBalanceProvider for FixedBalanceProvider {
    async fn get_balance(&self, _wallet: &Pubkey) -> paywall_wallet_pool::Result<f64> {
        Ok(self.0)
    }
}

/// Counts each observability hook invocation, for asserting hook wiring in
/// integration-style tests without caring about the payload.
#[derive(Default)]
pub struct CountingObservability {
    pub payment_started: AtomicUsize,
    pub payment_completed: AtomicUsize,
    pub payment_settled: AtomicUsize,
    pub amount_mismatch: AtomicUsize,
    pub refund_requested: AtomicUsize,
    pub refund_settled: AtomicUsize,
    pub cart_checked_out: AtomicUsize,
}

impl Observability for CountingObservability {
    fn payment_started(&self, _resource_id: &str) {
        self.payment_started.fetch_add(1, Ordering::SeqCst);
    }

    fn payment_completed(&self, _resource_id: &str, _signature: &str) {
        self.payment_completed.fetch_add(1, Ordering::SeqCst);
    }

    fn payment_settled(&self, _resource_id: &str, _signature: &str) {
        self.payment_settled.fetch_add(1, Ordering::SeqCst);
    }

    fn amount_mismatch(&self, _resource_id: &str, _required: &str, _paid: &str) {
        self.amount_mismatch.fetch_add(1, Ordering::SeqCst);
    }

    fn refund_requested(&self, _refund_id: &str) {
        self.refund_requested.fetch_add(1, Ordering::SeqCst);
    }

    fn refund_settled(&self, _refund_id: &str, _signature: &str) {
        self.refund_settled.fetch_add(1, Ordering::SeqCst);
    }

    fn cart_checked_out(&self, _cart_id: &str) {
        self.cart_checked_out.fetch_add(1, Ordering::SeqCst);
    }
}
