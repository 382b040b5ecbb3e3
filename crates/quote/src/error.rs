#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Money(#[from] paywall_money::Error),

    #[error(transparent)]
    Coupon(#[from] paywall_coupon::Error),

    #[error("resource `{0}` has no price configured for this payment method")]
    ResourceNotConfigured(String),

    #[error("cart cannot mix items priced in different on-chain tokens (`{first}` vs `{second}`)")]
    MixedCartAssets { first: String, second: String },

    #[error("cart item quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
