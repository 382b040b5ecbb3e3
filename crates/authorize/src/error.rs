/// The authorization service's externally-observable error taxonomy. Every
/// variant's `Display` output is the user-safe message the caller may relay
/// to a client; anything more revealing is logged via `tracing` at the call
/// site rather than embedded here.
///
/// Collaborator errors (money, coupon, quote, store, on-chain, wallet pool)
/// are wrapped transparently so a caller matching on `Error::Store(_)` still
/// sees the collaborator's own typed variants underneath. The one exception
/// is [`paywall_store::Error::AlreadyUsed`], which this crate always
/// re-wraps into its own [`Error::AlreadyUsed`] so the message can carry the
/// resource id; see [`crate::ledger`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Money(#[from] paywall_money::Error),

    #[error(transparent)]
    Coupon(#[from] paywall_coupon::Error),

    #[error(transparent)]
    Quote(#[from] paywall_quote::Error),

    #[error(transparent)]
    Store(#[from] paywall_store::Error),

    #[error(transparent)]
    Chain(#[from] paywall_chain_solana::Error),

    #[error(transparent)]
    WalletPool(#[from] paywall_wallet_pool::Error),

    #[error("resource `{0}` has no price configured for this payment method")]
    ResourceNotConfigured(String),

    #[error("unknown resource `{0}`")]
    UnknownResource(String),

    #[error("a payment proof is required for this resource")]
    ProofRequired,

    #[error("fiat session is still pending confirmation")]
    FiatSessionPending,

    #[error("payment proof has already been used (originally for resource: {original_resource_id})")]
    AlreadyUsed { original_resource_id: String },

    #[error("paid amount {paid} does not match the required amount {required}")]
    AmountMismatch { required: String, paid: String },

    #[error("only the server wallet can issue refunds")]
    NotServerWallet,

    #[error("refund quote `{0}` is already sealed")]
    RefundAlreadySealed(String),

    #[error("a refund request already exists for this original purchase")]
    RefundAlreadyRequested(String),

    #[error("cart `{0}` has no items")]
    EmptyCart(String),

    #[error("operation was cancelled")]
    Cancelled,
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
