use std::collections::HashMap;

use chrono::{DateTime, Utc};
use paywall_money::Money;
use paywall_store::{PaymentStatus, PaymentTransaction, Store};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Re-wraps [`paywall_store::Error::AlreadyUsed`] into this crate's own
/// variant so the message can name the original resource; every other
/// store error passes through transparently.
fn map_store_error(err: paywall_store::Error) -> Error {
    match err {
        paywall_store::Error::AlreadyUsed { original_resource_id } => Error::AlreadyUsed { original_resource_id },
        other => Error::Store(other),
    }
}

/// Inserts the signature pre-claim placeholder: `wallet=""`,
/// `status=Verifying`. Per the store contract this either creates the row,
/// overwrites an existing placeholder with an equivalent one, or fails with
/// [`Error::AlreadyUsed`] if the row is already sealed.
pub async fn claim_placeholder(
    store: &dyn Store,
    signature: &str,
    resource_id: &str,
    zero_amount: Money,
    now: DateTime<Utc>,
    cancel: &CancellationToken,
) -> Result<()> {
    let placeholder = PaymentTransaction {
        signature: signature.to_owned(),
        resource_id: resource_id.to_owned(),
        wallet: String::new(),
        amount: zero_amount,
        created_at: now,
        status: PaymentStatus::Verifying,
        metadata: HashMap::new(),
    };
    store.record_payment(placeholder, cancel).await.map_err(map_store_error)
}

/// Overwrites the placeholder (or inserts fresh, for sponsored proofs) with
/// the verified wallet, amount, sealed status, and metadata.
#[allow(clippy::too_many_arguments)]
pub async fn seal(
    store: &dyn Store,
    signature: &str,
    resource_id: &str,
    wallet: &str,
    amount: Money,
    now: DateTime<Utc>,
    metadata: HashMap<String, String>,
    cancel: &CancellationToken,
) -> Result<()> {
    let sealed = PaymentTransaction {
        signature: signature.to_owned(),
        resource_id: resource_id.to_owned(),
        wallet: wallet.to_owned(),
        amount,
        created_at: now,
        status: PaymentStatus::Verified,
        metadata,
    };
    store.record_payment(sealed, cancel).await.map_err(map_store_error)
}

/// Looks up an existing sealed row for `signature`, used by the refund
/// idempotency exception. Returns `None` for a missing row or a row that is
/// still a placeholder.
pub async fn get_sealed(store: &dyn Store, signature: &str, cancel: &CancellationToken) -> Result<Option<PaymentTransaction>> {
    match store.get_payment(signature, cancel).await {
        Ok(row) if row.is_sealed() => Ok(Some(row)),
        Ok(_) => Ok(None),
        Err(paywall_store::Error::NotFound) => Ok(None),
        Err(other) => Err(map_store_error(other)),
    }
}
