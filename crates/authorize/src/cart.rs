use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use paywall_chain_solana::{ChainClient, ConfirmationSubscriber};
use paywall_coupon::{Coupon, PaymentMethod, SelectScope, select_coupons_for_payment};
use paywall_money::{AssetMetadata, Money};
use paywall_quote::{CartQuote, Extra, OnChainQuote, ResourceDefinition, build_cart_quote};
use paywall_store::Store;
use paywall_wallet_pool::WalletPool;
use tokio_util::sync::CancellationToken;

use crate::{
    collaborators::{CouponRepository, Observability, notify_observer},
    config::AuthorizeConfig,
    error::{Error, Result},
    onchain::{OnChainAuthorizationParams, authorize_on_chain, build_requirement},
    outcome::{AuthorizationOutcome, Settlement},
    single::resolve_fee_payer_signer,
};

fn mint_address(money: &Money) -> String {
    match money.asset().metadata() {
        AssetMetadata::OnChainToken { mint_address } => mint_address.clone(),
        AssetMetadata::Fiat { .. } => String::new(),
    }
}

/// The product id [`build_cart_quote`] uses internally for its single
/// checkout-scoped coupon selection; mirrored here so the applied-coupon
/// bookkeeping below selects exactly the same set it did.
const CART_CHECKOUT_PRODUCT: &str = "__cart__";

/// Recomputes which coupon codes [`build_cart_quote`] actually folded into
/// the total, since [`CartQuote`] itself doesn't carry that list. Mirrors
/// `build_cart_quote`'s own per-item catalog selection plus its one
/// checkout-scoped selection exactly, so the result matches what was
/// actually applied rather than merely offered as a candidate.
fn collect_applied_cart_coupons(items: &[(ResourceDefinition, i64)], catalog_candidates: &[Coupon], checkout_candidates: &[Coupon]) -> Vec<String> {
    let mut codes = BTreeSet::new();
    for (resource, _quantity) in items {
        let applied = select_coupons_for_payment(catalog_candidates, &resource.resource_id, PaymentMethod::OnChain, None, SelectScope::Catalog);
        codes.extend(applied.into_iter().map(|c| c.code));
    }
    let checkout_applied = select_coupons_for_payment(checkout_candidates, CART_CHECKOUT_PRODUCT, PaymentMethod::OnChain, None, SelectScope::Checkout);
    codes.extend(checkout_applied.into_iter().map(|c| c.code));
    codes.into_iter().collect()
}

/// Locks a cart's prices, stashes the coupon codes it actually applied into
/// `metadata["applied_coupons"]` (so their usage counters can be
/// incremented once the cart is later paid), and persists it.
pub async fn create_cart(
    id: String,
    items: &[(ResourceDefinition, i64)],
    catalog_candidates: &[Coupon],
    checkout_candidates: &[Coupon],
    store: &dyn Store,
    config: &AuthorizeConfig,
    now: DateTime<Utc>,
    cancel: &CancellationToken,
) -> Result<CartQuote> {
    let mut cart = build_cart_quote(id, items, catalog_candidates, checkout_candidates, &config.quote, now)?;

    let applied = collect_applied_cart_coupons(items, catalog_candidates, checkout_candidates);
    if !applied.is_empty() {
        cart.metadata.insert("applied_coupons".to_owned(), applied.join(","));
    }

    store.save_cart_quote(cart.clone(), cancel).await?;
    Ok(cart)
}

fn cart_on_chain_envelope(cart: &CartQuote, config: &AuthorizeConfig) -> OnChainQuote {
    let applied_coupons = cart
        .metadata
        .get("applied_coupons")
        .map(|codes| codes.split(',').filter(|c| !c.is_empty()).map(str::to_owned).collect());

    OnChainQuote {
        scheme: config.quote.scheme.clone(),
        network: config.quote.network.clone(),
        max_amount_required: cart.total.atomic().to_string(),
        resource: cart.id.clone(),
        description: "cart checkout".to_owned(),
        mime_type: "application/octet-stream".to_owned(),
        pay_to: config.payout_wallet.clone(),
        asset: mint_address(&cart.total),
        max_timeout_seconds: config.quote.max_timeout_seconds,
        extra: Extra {
            recipient_token_account: String::new(),
            decimals: cart.total.asset().decimals(),
            token_symbol: cart.total.asset().code().to_owned(),
            memo: format!("{}:{}", config.quote.memo_prefix, cart.id),
            fee_payer: if config.quote.fee_sponsorship_enabled { config.quote.server_fee_payer.clone() } else { None },
            original_amount: None,
            discounted_amount: Some(cart.total.to_major()),
            applied_coupons,
            catalog_coupons: None,
            checkout_coupons: None,
        },
    }
}

pub struct CartAuthorizationRequest<'a> {
    pub cart_id: &'a str,
    pub proof: Option<&'a [u8]>,
    pub now: DateTime<Utc>,
}

#[allow(clippy::too_many_arguments)]
pub async fn authorize_cart(
    request: &CartAuthorizationRequest<'_>,
    store: &dyn Store,
    client: &dyn ChainClient,
    subscriber: Option<&dyn ConfirmationSubscriber>,
    wallet_pool: Option<&WalletPool>,
    coupons: &dyn CouponRepository,
    observability: &dyn Observability,
    config: &AuthorizeConfig,
    cancel: &CancellationToken,
) -> Result<AuthorizationOutcome> {
    notify_observer("payment_started", || observability.payment_started(request.cart_id));

    let cart = store.get_cart_quote(request.cart_id, request.now, cancel).await?;
    if cart.items.is_empty() {
        return Err(Error::EmptyCart(request.cart_id.to_owned()));
    }

    let on_chain_quote = cart_on_chain_envelope(&cart, config);

    let Some(raw_proof) = request.proof else {
        return Ok(AuthorizationOutcome::NotGranted {
            on_chain_quote: Some(on_chain_quote),
            fiat_quote: None,
        });
    };

    let applied_coupon_codes: Vec<String> = cart
        .metadata
        .get("applied_coupons")
        .map(|codes| codes.split(',').filter(|c| !c.is_empty()).map(str::to_owned).collect())
        .unwrap_or_default();

    let requirement = build_requirement(request.cart_id, &cart.total, &config.payout_wallet, None, config);
    let fee_payer_signer = resolve_fee_payer_signer(config, wallet_pool)?;

    let settlement = authorize_on_chain(OnChainAuthorizationParams {
        raw_proof,
        requirement,
        expected: cart.total.clone(),
        original_amount: None,
        tolerance_atomic: config.cart_amount_tolerance_atomic,
        resource_id: request.cart_id,
        kind: "cart",
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

    notify_observer("cart_checked_out", || observability.cart_checked_out(request.cart_id));

    Ok(AuthorizationOutcome::GrantedOnChain {
        settlement: Settlement {
            success: true,
            tx_hash: settlement.signature,
            network_id: config.quote.network.clone(),
            access_expires_at: config.access_expires_at(request.now),
        },
    })
}
