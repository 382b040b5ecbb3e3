use chrono::{DateTime, Utc};
use paywall_coupon::{ApplyAtScope, Coupon, PaymentMethod, SelectScope, select_coupons_for_payment, stack_coupons_on_money};
use paywall_money::{AssetMetadata, Money, RoundingMode};

use crate::{
    cart::{CartItem, CartQuote},
    config::QuoteConfig,
    envelope::{Extra, FiatQuote, OnChainQuote},
    error::{Error, Result},
    refund::RefundQuote,
    resource::ResourceDefinition,
};

fn split_applied_codes(coupons: &[Coupon]) -> (Vec<String>, Vec<String>) {
    let mut catalog = Vec::new();
    let mut checkout = Vec::new();
    for coupon in coupons {
        match coupon.apply_at {
            ApplyAtScope::Catalog => catalog.push(coupon.code.clone()),
            ApplyAtScope::Checkout => checkout.push(coupon.code.clone()),
        }
    }
    (catalog, checkout)
}

fn mint_address(money: &Money) -> String {
    match money.asset().metadata() {
        AssetMetadata::OnChainToken { mint_address } => mint_address.clone(),
        AssetMetadata::Fiat { .. } => String::new(),
    }
}

/// Builds the on-chain quote (and, when the resource has a fiat price, an
/// independent fiat option) for a single resource. Returns the envelope
/// pair plus the instant at which the server should consider this quoted
/// amount stale (`now + config.quote_ttl`) and recompute on the next
/// request rather than trusting a cached figure.
pub fn build_single_quote(
    resource: &ResourceDefinition,
    coupon_candidates: &[Coupon],
    manual_coupon: Option<Coupon>,
    config: &QuoteConfig,
    now: DateTime<Utc>,
) -> Result<(OnChainQuote, Option<FiatQuote>, DateTime<Utc>)> {
    let on_chain_price = resource
        .on_chain_price
        .as_ref()
        .ok_or_else(|| Error::ResourceNotConfigured(resource.resource_id.clone()))?;

    let applied = select_coupons_for_payment(
        coupon_candidates,
        &resource.resource_id,
        PaymentMethod::OnChain,
        manual_coupon.clone(),
        SelectScope::All,
    );

    let discounted = stack_coupons_on_money(&on_chain_price.amount, &applied, RoundingMode::Ceiling)?
        .round_up_to_cents();

    let (catalog_coupons, checkout_coupons) = split_applied_codes(&applied);
    let applied_codes: Vec<String> = applied.iter().map(|c| c.code.clone()).collect();

    let recipient_token_account = on_chain_price.recipient_token_account.clone().unwrap_or_default();

    let on_chain_quote = OnChainQuote {
        scheme: config.scheme.clone(),
        network: config.network.clone(),
        max_amount_required: discounted.atomic().to_string(),
        resource: resource.resource_id.clone(),
        description: resource.description.clone(),
        mime_type: "application/octet-stream".to_owned(),
        pay_to: config.payout_wallet.clone(),
        asset: mint_address(&discounted),
        max_timeout_seconds: config.max_timeout_seconds,
        extra: Extra {
            recipient_token_account,
            decimals: discounted.asset().decimals(),
            token_symbol: discounted.asset().code().to_owned(),
            memo: format!("{}:{}", config.memo_prefix, resource.resource_id),
            fee_payer: fee_payer_if_sponsored(config),
            original_amount: Some(on_chain_price.amount.to_major()),
            discounted_amount: Some(discounted.to_major()),
            applied_coupons: Some(applied_codes),
            catalog_coupons: Some(catalog_coupons),
            checkout_coupons: Some(checkout_coupons),
        },
    };

    let fiat_quote = resource
        .fiat_price
        .as_ref()
        .map(|fiat| -> Result<FiatQuote> {
            let applied = select_coupons_for_payment(
                coupon_candidates,
                &resource.resource_id,
                PaymentMethod::Fiat,
                manual_coupon.clone(),
                SelectScope::All,
            );
            let discounted = stack_coupons_on_money(&fiat.amount, &applied, RoundingMode::Ceiling)?.round_up_to_cents();
            Ok(FiatQuote {
                external_price_id: fiat.external_price_id.clone(),
                amount: discounted.to_major(),
                currency: discounted.asset().code().to_owned(),
            })
        })
        .transpose()?;

    Ok((on_chain_quote, fiat_quote, now + config.quote_ttl))
}

fn fee_payer_if_sponsored(config: &QuoteConfig) -> Option<String> {
    if config.fee_sponsorship_enabled { config.server_fee_payer.clone() } else { None }
}

/// Builds a locked [`CartQuote`] from resource/quantity pairs. Catalog-only
/// coupons apply per-item before multiplying by quantity; checkout-only
/// coupons apply once to the summed total.
pub fn build_cart_quote(
    id: String,
    items: &[(ResourceDefinition, i64)],
    catalog_candidates: &[Coupon],
    checkout_candidates: &[Coupon],
    config: &QuoteConfig,
    now: DateTime<Utc>,
) -> Result<CartQuote> {
    let mut locked_items = Vec::with_capacity(items.len());
    let mut total: Option<Money> = None;

    for (resource, quantity) in items {
        if *quantity < 1 {
            return Err(Error::InvalidQuantity(*quantity));
        }
        let price = resource
            .on_chain_price
            .as_ref()
            .ok_or_else(|| Error::ResourceNotConfigured(resource.resource_id.clone()))?;

        if let Some(existing) = &total {
            if existing.asset() != price.amount.asset() {
                return Err(Error::MixedCartAssets {
                    first: existing.asset().code().to_owned(),
                    second: price.amount.asset().code().to_owned(),
                });
            }
        }

        let catalog_applied = select_coupons_for_payment(
            catalog_candidates,
            &resource.resource_id,
            PaymentMethod::OnChain,
            None,
            SelectScope::Catalog,
        );
        let unit_discounted = stack_coupons_on_money(&price.amount, &catalog_applied, RoundingMode::Ceiling)?;
        let line_total = unit_discounted.checked_mul(*quantity)?;

        total = Some(match total {
            Some(running) => running.checked_add(&line_total)?,
            None => line_total,
        });

        locked_items.push(CartItem {
            resource_id: resource.resource_id.clone(),
            quantity: *quantity,
            original_unit_price: price.amount.clone(),
            locked_unit_price: unit_discounted,
            metadata: resource.metadata.clone(),
        });
    }

    let running_total = total.ok_or_else(|| Error::InvalidQuantity(0))?;

    let checkout_applied = select_coupons_for_payment(
        checkout_candidates,
        "__cart__",
        PaymentMethod::OnChain,
        None,
        SelectScope::Checkout,
    );
    let total = stack_coupons_on_money(&running_total, &checkout_applied, RoundingMode::Ceiling)?.round_up_to_cents();

    Ok(CartQuote {
        id,
        items: locked_items,
        total,
        metadata: Default::default(),
        created_at: now,
        expires_at: now + config.quote_ttl,
        paid_by: None,
    })
}

/// Regenerates the on-chain envelope for a refund request. The caller is
/// responsible for refreshing `refund.expires_at` (the execution window)
/// before persisting — this only rebuilds the wire envelope, since refunds
/// carry their own locked amount and asset rather than recomputing one.
pub fn build_refund_envelope(refund: &RefundQuote, config: &QuoteConfig) -> OnChainQuote {
    OnChainQuote {
        scheme: config.scheme.clone(),
        network: config.network.clone(),
        max_amount_required: refund.amount.atomic().to_string(),
        resource: refund.id.clone(),
        description: "refund".to_owned(),
        mime_type: "application/octet-stream".to_owned(),
        pay_to: refund.recipient_wallet.clone(),
        asset: mint_address(&refund.amount),
        max_timeout_seconds: config.max_timeout_seconds,
        extra: Extra {
            recipient_token_account: String::new(),
            decimals: refund.amount.asset().decimals(),
            token_symbol: refund.amount.asset().code().to_owned(),
            memo: format!("{}:{}", config.memo_prefix, refund.id),
            fee_payer: fee_payer_if_sponsored(config),
            original_amount: None,
            discounted_amount: None,
            applied_coupons: None,
            catalog_coupons: None,
            checkout_coupons: None,
        },
    }
}
