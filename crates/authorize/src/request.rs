use chrono::{DateTime, Utc};

const CART_PREFIX: &str = "cart_";
const REFUND_PREFIX: &str = "refund_";

/// The top-level `Authorize` call: `Authorize(resource_id, fiat_session?,
/// proof?, coupon_code?)`. Dispatch between the single-resource, cart, and
/// refund paths is entirely by `resource_id` prefix.
#[derive(Debug, Clone)]
pub struct AuthorizeRequest {
    pub resource_id: String,
    /// The `X-Stripe-Session` header, asserting the client initiated a
    /// fiat checkout. The core has no fiat-gateway collaborator to confirm
    /// it, so its mere presence (without a settled on-chain proof) resolves
    /// to [`crate::Error::FiatSessionPending`].
    pub fiat_session: Option<String>,
    /// The raw `X-PAYMENT` header bytes, UTF-8 JSON optionally
    /// base64-wrapped.
    pub proof: Option<Vec<u8>>,
    pub coupon_code: Option<String>,
    /// The `X-Wallet` header, used only to probe an optional subscription
    /// checker.
    pub wallet: Option<String>,
    pub now: DateTime<Utc>,
}

/// Which path a resource id dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPath {
    Cart,
    Refund,
    Single,
}

impl AuthorizeRequest {
    pub fn dispatch_path(&self) -> DispatchPath {
        if self.resource_id.starts_with(CART_PREFIX) {
            DispatchPath::Cart
        } else if self.resource_id.starts_with(REFUND_PREFIX) {
            DispatchPath::Refund
        } else {
            DispatchPath::Single
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(resource_id: &str) -> AuthorizeRequest {
        AuthorizeRequest {
            resource_id: resource_id.to_owned(),
            fiat_session: None,
            proof: None,
            coupon_code: None,
            wallet: None,
            now: Utc::now(),
        }
    }

    #[test]
    fn dispatches_by_resource_id_prefix() {
        assert_eq!(request("cart_abc").dispatch_path(), DispatchPath::Cart);
        assert_eq!(request("refund_abc").dispatch_path(), DispatchPath::Refund);
        assert_eq!(request("premium_article").dispatch_path(), DispatchPath::Single);
    }
}
