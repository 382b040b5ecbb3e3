use std::collections::HashMap;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use paywall_chain_solana::{ChainClient, ConfirmationSubscriber, parse_envelope, verify_payment};
use paywall_money::Money;
use paywall_quote::{OnChainQuote, RefundQuote, build_refund_envelope};
use paywall_store::Store;
use tokio_util::sync::CancellationToken;

use crate::{
    collaborators::{Observability, notify_observer},
    config::AuthorizeConfig,
    error::{Error, Result},
    ledger,
    onchain::build_requirement,
    outcome::{AuthorizationOutcome, Settlement},
};

const REFUND_PREFIX: &str = "refund_";

/// Derives a refund quote's id deterministically from the original
/// purchase signature it refunds. Keying on the signature, rather than a
/// caller-supplied id, is what lets [`Store::create_refund_quote`] enforce
/// "at most one `RefundQuote` per original purchase id" as a plain
/// insert-if-absent instead of a separate uniqueness index.
pub fn refund_quote_id(original_signature: &str) -> String {
    format!("{REFUND_PREFIX}{original_signature}")
}

/// The fields needed to open a new refund request. `execution_window` is
/// the initial blockhash-validity budget for the quote's first envelope;
/// [`regenerate_refund_quote`] refreshes it on each re-quote.
pub struct RefundCreationRequest<'a> {
    pub original_signature: &'a str,
    pub recipient_wallet: &'a str,
    pub amount: Money,
    pub reason: Option<String>,
    pub execution_window: ChronoDuration,
    pub now: DateTime<Utc>,
}

/// Opens a new refund request. Fails with [`Error::RefundAlreadyRequested`]
/// if a refund for this original signature already exists — the admin UI
/// is expected to retry authorization against the existing quote rather
/// than open a second one.
pub async fn create_refund_request(
    request: RefundCreationRequest<'_>,
    store: &dyn Store,
    observability: &dyn Observability,
    cancel: &CancellationToken,
) -> Result<RefundQuote> {
    let id = refund_quote_id(request.original_signature);
    let refund = RefundQuote {
        id: id.clone(),
        original_signature: request.original_signature.to_owned(),
        recipient_wallet: request.recipient_wallet.to_owned(),
        amount: request.amount,
        reason: request.reason,
        metadata: HashMap::new(),
        created_at: request.now,
        expires_at: request.now + request.execution_window,
        processed_by: None,
        processed_at: None,
        executing_signature: None,
    };

    store.create_refund_quote(refund.clone(), cancel).await.map_err(|error| match error {
        paywall_store::Error::RefundAlreadyExists(id) => Error::RefundAlreadyRequested(id),
        other => Error::Store(other),
    })?;

    notify_observer("refund_requested", || observability.refund_requested(&id));
    Ok(refund)
}

/// Refreshes a refund request's execution window and rebuilds its on-chain
/// envelope. Rejects an already-sealed quote — `SEALED` is terminal. This
/// is the `CREATED → (re-quoted*)*` transition in the refund lifecycle; it
/// never touches the locked `amount`/`recipient_wallet`, only `expires_at`.
pub async fn regenerate_refund_quote(
    id: &str,
    store: &dyn Store,
    config: &AuthorizeConfig,
    now: DateTime<Utc>,
    cancel: &CancellationToken,
) -> Result<(RefundQuote, OnChainQuote)> {
    let mut refund = store.get_refund_quote(id, cancel).await?;
    if refund.is_sealed() {
        return Err(Error::RefundAlreadySealed(id.to_owned()));
    }
    refund.expires_at = now + config.quote.quote_ttl;
    store.save_refund_quote(refund.clone(), cancel).await?;

    let envelope = build_refund_envelope(&refund, &config.quote);
    Ok((refund, envelope))
}

/// Denies (deletes) a refund request. Rejects an already-sealed quote —
/// `DENY` on `SEALED` is not a valid transition.
pub async fn deny_refund_request(id: &str, store: &dyn Store, cancel: &CancellationToken) -> Result<()> {
    store.deny_refund_quote(id, cancel).await.map_err(|error| match error {
        paywall_store::Error::CannotDenySealedRefund(id) => Error::RefundAlreadySealed(id),
        other => Error::Store(other),
    })
}

pub struct RefundAuthorizationRequest<'a> {
    pub refund_id: &'a str,
    pub proof: Option<&'a [u8]>,
    pub now: DateTime<Utc>,
}

/// Runs the refund path. Structurally similar to
/// [`crate::onchain::authorize_on_chain`] but with two refund-specific
/// deviations §4.4 calls out:
///
/// - **Refund authorization.** The verified transfer's sender must equal
///   the configured server payout wallet, not the customer — a refund is
///   money moving *out of* the server's own wallet.
/// - **Idempotency exception.** Refund proofs are never sponsored (the
///   server signs and sends its own payout), so the signature pre-claim
///   always runs. If it collides with a row already sealed for *this exact
///   refund id*, that is not a replay — it is the admin UI retrying after a
///   network timeout on a refund that in fact already landed — so this
///   returns the stored settlement instead of failing.
///
/// Unlike the single-resource and cart paths, refunds never apply coupons,
/// so there is no usage-counter increment step here.
#[allow(clippy::too_many_arguments)]
#[tracing::instrument(skip_all, fields(refund_id = %request.refund_id))]
pub async fn authorize_refund(
    request: &RefundAuthorizationRequest<'_>,
    store: &dyn Store,
    client: &dyn ChainClient,
    subscriber: Option<&dyn ConfirmationSubscriber>,
    observability: &dyn Observability,
    config: &AuthorizeConfig,
    cancel: &CancellationToken,
) -> Result<AuthorizationOutcome> {
    let refund = store.get_refund_quote(request.refund_id, cancel).await?;
    let on_chain_quote = build_refund_envelope(&refund, &config.quote);

    let Some(raw_proof) = request.proof else {
        if refund.is_sealed() {
            return Err(Error::RefundAlreadySealed(request.refund_id.to_owned()));
        }
        return Ok(AuthorizationOutcome::NotGranted {
            on_chain_quote: Some(on_chain_quote),
            fiat_quote: None,
        });
    };

    let requirement = build_requirement(request.refund_id, &refund.amount, &refund.recipient_wallet, None, config);
    let envelope = parse_envelope(raw_proof)?;

    // A sealed refund being re-authorized with the same signature is the
    // admin UI retrying after a dropped response, not a new attempt — return
    // the original settlement. Any other proof against a sealed refund is
    // rejected outright rather than falling through to re-verify and re-pay.
    if refund.is_sealed() {
        if refund.executing_signature.as_deref() == Some(envelope.payload.signature.as_str()) {
            if let Some(sealed) = ledger::get_sealed(store, &envelope.payload.signature, cancel).await? {
                return Ok(AuthorizationOutcome::GrantedOnChain {
                    settlement: Settlement {
                        success: true,
                        tx_hash: sealed.signature,
                        network_id: config.quote.network.clone(),
                        access_expires_at: config.access_expires_at(request.now),
                    },
                });
            }
        }
        return Err(Error::RefundAlreadySealed(request.refund_id.to_owned()));
    }

    if let Err(error) = ledger::claim_placeholder(
        store,
        &envelope.payload.signature,
        request.refund_id,
        Money::zero(refund.amount.asset().clone()),
        request.now,
        cancel,
    )
    .await
    {
        if let Error::AlreadyUsed { original_resource_id } = &error {
            if original_resource_id == request.refund_id {
                if let Some(sealed) = ledger::get_sealed(store, &envelope.payload.signature, cancel).await? {
                    return Ok(AuthorizationOutcome::GrantedOnChain {
                        settlement: Settlement {
                            success: true,
                            tx_hash: sealed.signature,
                            network_id: config.quote.network.clone(),
                            access_expires_at: config.access_expires_at(request.now),
                        },
                    });
                }
            }
        }
        return Err(error);
    }

    let verified = verify_payment(raw_proof, &requirement, client, subscriber, None, config.rpc_poll_interval, cancel).await?;

    if verified.wallet.to_string() != config.payout_wallet {
        return Err(Error::NotServerWallet);
    }

    let paid_atomic = i64::try_from(verified.amount_raw).map_err(|_| Error::Chain(paywall_chain_solana::Error::AmountBelowMinimum))?;
    let paid = Money::from_atomic(refund.amount.asset().clone(), paid_atomic);
    let signature = verified.signature.to_string();
    let wallet = verified.wallet.to_string();

    if paid.atomic() != refund.amount.atomic() {
        notify_observer("amount_mismatch", || {
            observability.amount_mismatch(request.refund_id, &refund.amount.to_major(), &paid.to_major());
        });
        return Err(Error::AmountMismatch {
            required: refund.amount.to_major(),
            paid: paid.to_major(),
        });
    }

    let mut metadata = HashMap::new();
    metadata.insert("kind".to_owned(), "refund".to_owned());
    metadata.insert("network".to_owned(), requirement.network.clone());
    ledger::seal(store, &signature, request.refund_id, &wallet, paid.clone(), request.now, metadata, cancel).await?;

    let mut sealed_refund = refund;
    sealed_refund.processed_by = Some(wallet);
    sealed_refund.processed_at = Some(request.now);
    sealed_refund.executing_signature = Some(signature.clone());
    store.save_refund_quote(sealed_refund, cancel).await?;

    notify_observer("refund_settled", || observability.refund_settled(request.refund_id, &signature));

    Ok(AuthorizationOutcome::GrantedOnChain {
        settlement: Settlement {
            success: true,
            tx_hash: signature,
            network_id: config.quote.network.clone(),
            access_expires_at: config.access_expires_at(request.now),
        },
    })
}
