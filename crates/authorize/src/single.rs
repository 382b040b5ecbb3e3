use chrono::{DateTime, Utc};
use paywall_chain_solana::{ChainClient, ConfirmationSubscriber, FeePayerSigner};
use paywall_coupon::PaymentMethod;
use paywall_money::Money;
use paywall_quote::build_single_quote;
use paywall_store::Store;
use paywall_wallet_pool::WalletPool;
use tokio_util::sync::CancellationToken;

use crate::{
    collaborators::{CouponRepository, Observability, ProductRepository, SubscriptionChecker, notify_observer},
    config::AuthorizeConfig,
    error::{Error, Result},
    onchain::{OnChainAuthorizationParams, authorize_on_chain, build_requirement},
    outcome::{AuthorizationOutcome, Settlement},
};

/// The collaborators and raw request fields needed to authorize a single,
/// non-cart, non-refund resource id.
pub struct SingleAuthorizationRequest<'a> {
    pub resource_id: &'a str,
    pub wallet: Option<&'a str>,
    pub coupon_code: Option<&'a str>,
    pub proof: Option<&'a [u8]>,
    pub fiat_session_present: bool,
    pub now: DateTime<Utc>,
}

#[allow(clippy::too_many_arguments)]
pub async fn authorize_single(
    request: &SingleAuthorizationRequest<'_>,
    products: &dyn ProductRepository,
    coupons: &dyn CouponRepository,
    subscriptions: Option<&dyn SubscriptionChecker>,
    store: &dyn Store,
    client: &dyn ChainClient,
    subscriber: Option<&dyn ConfirmationSubscriber>,
    wallet_pool: Option<&WalletPool>,
    observability: &dyn Observability,
    config: &AuthorizeConfig,
    cancel: &CancellationToken,
) -> Result<AuthorizationOutcome> {
    notify_observer("payment_started", || observability.payment_started(request.resource_id));

    if let (Some(checker), Some(wallet)) = (subscriptions, request.wallet) {
        if checker.has_access(wallet, request.resource_id).await? {
            return Ok(AuthorizationOutcome::GrantedFiat { fiat_quote: None });
        }
    }

    let resource = products.get_product(request.resource_id).await?;

    let manual_coupon = match request.coupon_code {
        Some(code) => coupons.get_coupon(code).await?,
        None => None,
    };
    let auto_candidates = coupons.get_auto_apply_coupons(request.resource_id, PaymentMethod::OnChain).await?;

    let (on_chain_quote, fiat_quote, _expires_at) =
        build_single_quote(&resource, &auto_candidates, manual_coupon, &config.quote, request.now)?;

    let Some(raw_proof) = request.proof else {
        if request.fiat_session_present {
            return Err(Error::FiatSessionPending);
        }
        return Ok(AuthorizationOutcome::NotGranted {
            on_chain_quote: Some(on_chain_quote),
            fiat_quote,
        });
    };

    let on_chain_price = resource
        .on_chain_price
        .as_ref()
        .ok_or_else(|| Error::ResourceNotConfigured(request.resource_id.to_owned()))?;

    // `max_amount_required` is the atomic amount `build_single_quote` just
    // emitted via `Money::atomic().to_string()`, so it always parses.
    let expected_atomic: i64 = on_chain_quote.max_amount_required.parse().expect("quote builder emits a valid atomic decimal string");
    let expected = Money::from_atomic(on_chain_price.amount.asset().clone(), expected_atomic);
    let applied_coupon_codes = on_chain_quote.extra.applied_coupons.clone().unwrap_or_default();
    let token_account = on_chain_price.recipient_token_account.clone();

    let requirement = build_requirement(request.resource_id, &expected, &config.payout_wallet, token_account, config);

    let fee_payer_signer = resolve_fee_payer_signer(config, wallet_pool)?;

    let settlement = authorize_on_chain(OnChainAuthorizationParams {
        raw_proof,
        requirement,
        expected: expected.clone(),
        original_amount: Some(on_chain_price.amount.clone()),
        tolerance_atomic: 0,
        resource_id: request.resource_id,
        kind: "single",
        applied_coupon_codes: &applied_coupon_codes,
        store,
        client,
        subscriber,
        fee_payer_signer,
        coupons,
        observability,
        config,
        now: request.now,
        cancel,
    })
    .await?;

    notify_observer("payment_completed", || {
        observability.payment_completed(request.resource_id, &settlement.signature);
    });

    Ok(AuthorizationOutcome::GrantedOnChain {
        settlement: Settlement {
            success: true,
            tx_hash: settlement.signature,
            network_id: config.quote.network.clone(),
            access_expires_at: config.access_expires_at(request.now),
        },
    })
}

/// Resolves a sponsor wallet only when fee sponsorship is actually enabled
/// for this quote configuration; an unsponsored proof never needs one, so a
/// caller with no pool configured (or a temporarily exhausted one) can still
/// serve unsponsored purchases.
pub(crate) fn resolve_fee_payer_signer<'a>(config: &AuthorizeConfig, wallet_pool: Option<&'a WalletPool>) -> Result<Option<&'a dyn FeePayerSigner>> {
    if !config.quote.fee_sponsorship_enabled {
        return Ok(None);
    }
    let Some(pool) = wallet_pool else {
        return Ok(None);
    };
    Ok(Some(pool.select_signer()?))
}
