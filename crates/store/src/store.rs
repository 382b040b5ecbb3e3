use chrono::{DateTime, Utc};
use paywall_quote::{CartQuote, RefundQuote};
use tokio_util::sync::CancellationToken;

use crate::{error::Result, nonce::AdminNonce, payment::PaymentTransaction};

/// The abstract persistence contract. Every method accepts a
/// [`CancellationToken`] so long-running backends (network-bound SQL/Mongo
/// drivers) can abort promptly; the in-memory reference backend in
/// `paywall-store-memory` ignores it since its operations complete
/// synchronously.
///
/// The one operation with a real contract beyond plain CRUD is
/// [`Store::record_payment`] — see its doc comment for the exactly-once
/// semantics every backend must uphold.
#[async_trait::async_trait]
pub trait Store: Send + Sync + 'static {
    /// Atomically inserts or upgrades the ledger row for `tx.signature`:
    ///
    /// - No existing row → insert, success.
    /// - Existing row is a placeholder (see [`PaymentTransaction::is_placeholder`])
    ///   → overwrite with `tx`, success.
    /// - Existing row is sealed → fail with [`crate::Error::AlreadyUsed`]
    ///   carrying the sealed row's `resource_id`.
    ///
    /// Backends must implement this as a single atomic operation (a
    /// conditional SQL upsert, a conditional Mongo update, or a
    /// mutex-guarded map) — never as a separate read-then-write, which
    /// would reopen the race this method exists to close.
    async fn record_payment(&self, tx: PaymentTransaction, cancel: &CancellationToken) -> Result<()>;

    async fn get_payment(&self, signature: &str, cancel: &CancellationToken) -> Result<PaymentTransaction>;

    /// All-or-nothing batch insert: pre-checks for intra-batch duplicate
    /// signatures and collisions against existing sealed rows, and only
    /// writes any of them if none collide.
    async fn record_payments(&self, txs: Vec<PaymentTransaction>, cancel: &CancellationToken) -> Result<()>;

    async fn save_cart_quote(&self, cart: CartQuote, cancel: &CancellationToken) -> Result<()>;

    /// Returns [`crate::Error::CartExpired`] once `now` has passed the
    /// cart's `expires_at`, even though the row still physically exists.
    async fn get_cart_quote(&self, id: &str, now: DateTime<Utc>, cancel: &CancellationToken) -> Result<CartQuote>;

    /// Validates every item before mutating any row (fail fast, no partial
    /// writes), matching [`Store::record_payments`]'s batch contract.
    async fn save_cart_quotes(&self, carts: Vec<CartQuote>, cancel: &CancellationToken) -> Result<()>;

    /// Inserts a brand-new refund request, failing with
    /// [`crate::Error::RefundAlreadyExists`] if a quote with this id already
    /// exists. Callers derive the id deterministically from the original
    /// purchase signature so this enforces the "at most one `RefundQuote`
    /// per original purchase id" invariant atomically, the same way
    /// [`Store::create_nonce`] enforces id uniqueness for nonces.
    async fn create_refund_quote(&self, refund: RefundQuote, cancel: &CancellationToken) -> Result<()>;

    /// Overwrites an existing refund request — re-quoting (fresh
    /// `expires_at`) or sealing. Never used to create the initial row; see
    /// [`Store::create_refund_quote`].
    async fn save_refund_quote(&self, refund: RefundQuote, cancel: &CancellationToken) -> Result<()>;

    /// Never treats expiry as not-found — refund requests are eternal until
    /// denied or sealed, unlike [`Store::get_cart_quote`].
    async fn get_refund_quote(&self, id: &str, cancel: &CancellationToken) -> Result<RefundQuote>;

    async fn save_refund_quotes(&self, refunds: Vec<RefundQuote>, cancel: &CancellationToken) -> Result<()>;

    /// Deletes a refund request outright (the `DENIED` transition). Fails
    /// if the stored quote is already sealed.
    async fn deny_refund_quote(&self, id: &str, cancel: &CancellationToken) -> Result<()>;

    /// Fails with [`crate::Error::NonceAlreadyExists`] if `nonce.id` is
    /// already present.
    async fn create_nonce(&self, nonce: AdminNonce, cancel: &CancellationToken) -> Result<()>;

    /// Atomically transitions an unconsumed, unexpired nonce to consumed;
    /// otherwise reports via [`crate::Error::NonceNotConsumable`] which
    /// precondition failed.
    async fn consume_nonce(&self, id: &str, now: DateTime<Utc>, cancel: &CancellationToken) -> Result<()>;

    /// Deletes every ledger row with `created_at < cutoff`, returning the
    /// count removed.
    async fn archive_old_payments(&self, cutoff: DateTime<Utc>, cancel: &CancellationToken) -> Result<u64>;

    /// Deletes every nonce with `expires_at < now`, returning the count
    /// removed.
    async fn cleanup_expired_nonces(&self, now: DateTime<Utc>, cancel: &CancellationToken) -> Result<u64>;
}
