use std::collections::HashMap;

use chrono::{DateTime, Utc};
use paywall_chain_solana::{ChainClient, ConfirmationSubscriber, FeePayerSigner, Requirement, Scheme, parse_envelope, verify_payment};
use paywall_money::{AssetMetadata, Money};
use paywall_store::Store;
use tokio_util::sync::CancellationToken;

use crate::{
    collaborators::{CouponRepository, Observability, notify_observer},
    config::AuthorizeConfig,
    error::{Error, Result},
    ledger,
};

fn mint_address(money: &Money) -> String {
    match money.asset().metadata() {
        AssetMetadata::OnChainToken { mint_address } => mint_address.clone(),
        AssetMetadata::Fiat { .. } => String::new(),
    }
}

/// Builds the [`Requirement`] a proof is checked against. `owner` and
/// `token_account` are the expected transfer recipient — the server's
/// payout wallet for an ordinary purchase, or the customer's wallet for a
/// refund (see [`crate::refund`]).
///
/// `expected_amount` is left at `0.0` rather than the quoted price: the
/// verifier's own minimum-amount floor would otherwise reject an
/// underpayment as `AmountBelowMinimum` before `authorize_on_chain` ever
/// gets to compare it against `expected` and report a proper
/// `AmountMismatch` carrying both figures. The atomic-exact (or
/// tolerance-bounded, for carts) comparison in `authorize_on_chain` is the
/// sole authority on whether a paid amount is acceptable.
pub fn build_requirement(resource_id: &str, expected: &Money, owner: &str, token_account: Option<String>, config: &AuthorizeConfig) -> Requirement {
    Requirement {
        resource_id: resource_id.to_owned(),
        expected_amount: 0.0,
        mint: mint_address(expected),
        decimals: expected.asset().decimals(),
        recipient_owner: owner.to_owned(),
        recipient_token_account: token_account,
        network: config.quote.network.clone(),
        allowed_schemes: vec![Scheme::SolanaSplTransfer],
        commitment: config.commitment,
        skip_preflight: config.skip_preflight,
        quote_ttl: config.quote.quote_ttl,
        auto_create_ata: config.auto_create_ata,
    }
}

/// What survives a confirmed, amount-matched on-chain authorization.
#[derive(Debug, Clone)]
pub struct VerifiedSettlement {
    pub wallet: String,
    pub amount: Money,
    pub signature: String,
    pub sponsored: bool,
}

/// Everything [`authorize_on_chain`] needs, gathered into one struct so the
/// call site reads as a record rather than a long positional argument list.
pub struct OnChainAuthorizationParams<'a> {
    pub raw_proof: &'a [u8],
    pub requirement: Requirement,
    pub expected: Money,
    pub original_amount: Option<Money>,
    pub tolerance_atomic: i64,
    pub resource_id: &'a str,
    pub kind: &'static str,
    pub applied_coupon_codes: &'a [String],
    pub store: &'a dyn Store,
    pub client: &'a dyn ChainClient,
    pub subscriber: Option<&'a dyn ConfirmationSubscriber>,
    pub fee_payer_signer: Option<&'a dyn FeePayerSigner>,
    pub coupons: &'a dyn CouponRepository,
    pub observability: &'a dyn Observability,
    pub config: &'a AuthorizeConfig,
    pub now: DateTime<Utc>,
    pub cancel: &'a CancellationToken,
}

fn seal_metadata(params: &OnChainAuthorizationParams<'_>, paid: &Money) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    metadata.insert("kind".to_owned(), params.kind.to_owned());
    metadata.insert("network".to_owned(), params.requirement.network.clone());
    metadata.insert("discounted_amount".to_owned(), params.expected.to_major());
    metadata.insert("paid_amount".to_owned(), paid.to_major());
    if let Some(original) = &params.original_amount {
        metadata.insert("original_amount".to_owned(), original.to_major());
    }
    if !params.applied_coupon_codes.is_empty() {
        metadata.insert("applied_coupons".to_owned(), params.applied_coupon_codes.join(","));
    }
    metadata
}

/// Runs the shared verify → amount-match → seal → coupon-increment sequence
/// used identically by the single-resource, cart, and refund paths:
///
/// - Non-sponsored proofs pre-claim the signature placeholder before the
///   verifier runs (TOCTOU defense); sponsored proofs skip this since their
///   signature isn't knowable until after confirmation.
/// - The verifier's returned amount is converted straight to atomic units
///   and compared as an integer — it never participates in float math here.
/// - On a mismatch: non-sponsored proofs leave the placeholder untouched
///   (reserving the signature for a later retry); sponsored proofs still
///   seal the ledger with the amount actually paid, since that signature is
///   only knowable now and must be reserved against replay even though this
///   request is denied.
/// - On a match: seal, then best-effort increment each applied coupon's
///   usage counter (failures are logged, never fatal).
pub async fn authorize_on_chain(params: OnChainAuthorizationParams<'_>) -> Result<VerifiedSettlement> {
    let envelope = parse_envelope(params.raw_proof)?;
    let sponsored = envelope.payload.is_sponsored();

    if !sponsored {
        ledger::claim_placeholder(
            params.store,
            &envelope.payload.signature,
            params.resource_id,
            Money::zero(params.expected.asset().clone()),
            params.now,
            params.cancel,
        )
        .await?;
    }

    let verified = verify_payment(
        params.raw_proof,
        &params.requirement,
        params.client,
        params.subscriber,
        params.fee_payer_signer,
        params.config.rpc_poll_interval,
        params.cancel,
    )
    .await?;

    let paid_atomic = i64::try_from(verified.amount_raw).map_err(|_| Error::Chain(paywall_chain_solana::Error::AmountBelowMinimum))?;
    let paid = Money::from_atomic(params.expected.asset().clone(), paid_atomic);
    let wallet = verified.wallet.to_string();
    let signature = verified.signature.to_string();

    let diff = (paid.atomic() - params.expected.atomic()).abs();
    if diff > params.tolerance_atomic.max(0) {
        notify_observer("amount_mismatch", || {
            params.observability.amount_mismatch(params.resource_id, &params.expected.to_major(), &paid.to_major());
        });

        if sponsored {
            let metadata = seal_metadata(&params, &paid);
            ledger::seal(params.store, &signature, params.resource_id, &wallet, paid.clone(), params.now, metadata, params.cancel).await?;
        }

        return Err(Error::AmountMismatch {
            required: params.expected.to_major(),
            paid: paid.to_major(),
        });
    }

    let metadata = seal_metadata(&params, &paid);
    ledger::seal(params.store, &signature, params.resource_id, &wallet, paid.clone(), params.now, metadata, params.cancel).await?;

    for code in params.applied_coupon_codes {
        if let Err(error) = params.coupons.increment_usage(code).await {
            tracing::warn!(code, %error, "coupon usage increment failed after ledger seal");
        }
    }

    notify_observer("payment_settled", || {
        params.observability.payment_settled(params.resource_id, &signature);
    });

    Ok(VerifiedSettlement { wallet, amount: paid, signature, sponsored })
}
