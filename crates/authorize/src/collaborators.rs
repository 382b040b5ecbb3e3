use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use paywall_coupon::{Coupon, PaymentMethod};
use paywall_quote::ResourceDefinition;

use crate::error::Result;

/// The product catalog, consumed as an interface — loading or persisting
/// catalog entries is entirely the implementation's concern.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn get_product(&self, resource_id: &str) -> Result<ResourceDefinition>;
    async fn get_product_by_external_price_id(&self, external_price_id: &str) -> Result<ResourceDefinition>;
    async fn list_products(&self) -> Result<Vec<ResourceDefinition>>;
}

/// The coupon catalog, consumed as an interface. `increment_usage` is
/// called best-effort after a ledger seal; see [`crate::onchain`].
#[async_trait]
pub trait CouponRepository: Send + Sync {
    async fn get_coupon(&self, code: &str) -> Result<Option<Coupon>>;
    async fn get_auto_apply_coupons(&self, product_id: &str, method: PaymentMethod) -> Result<Vec<Coupon>>;
    async fn increment_usage(&self, code: &str) -> Result<()>;
}

/// An optional subscription/entitlement probe. A positive result grants
/// access without requiring a payment proof at all.
#[async_trait]
pub trait SubscriptionChecker: Send + Sync {
    async fn has_access(&self, wallet: &str, product: &str) -> Result<bool>;
}

/// Lifecycle callback hooks for payment, refund, and cart events. Every
/// method has a no-op default so a collaborator only overrides what it
/// cares about; dispatch to a real sink (metrics, webhooks) is entirely the
/// implementation's concern. Hooks are invoked through [`notify_observer`]
/// so one hook's panic can never disturb another hook or the authorization
/// path itself.
pub trait Observability: Send + Sync {
    fn payment_started(&self, _resource_id: &str) {}
    fn payment_completed(&self, _resource_id: &str, _signature: &str) {}
    fn payment_settled(&self, _resource_id: &str, _signature: &str) {}
    fn amount_mismatch(&self, _resource_id: &str, _required: &str, _paid: &str) {}
    fn refund_requested(&self, _refund_id: &str) {}
    fn refund_settled(&self, _refund_id: &str, _signature: &str) {}
    fn cart_checked_out(&self, _cart_id: &str) {}
}

/// Calls an observability hook, catching any panic so it cannot propagate
/// into the authorization path or abort sibling hook calls.
pub fn notify_observer<F: FnOnce()>(hook_name: &'static str, call: F) {
    if std::panic::catch_unwind(AssertUnwindSafe(call)).is_err() {
        tracing::error!(hook_name, "observability hook panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_observer_isolates_a_panicking_hook() {
        let mut called = false;
        notify_observer("boom", || panic!("hook exploded"));
        notify_observer("fine", || called = true);
        assert!(called);
    }
}
