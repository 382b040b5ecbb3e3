use std::collections::HashMap;

use paywall_coupon::{Applicability, ApplyAtScope, Coupon, DiscountKind, PaymentMethodFilter};
use paywall_money::{Asset, Money};
use paywall_quote::{FiatPrice, OnChainPrice, ResourceDefinition};

/// Builder for a [`Coupon`] fixture, defaulting to an unlimited
/// all-products checkout-scope percent discount so tests only need to
/// override what they actually care about.
#[derive(Debug, Clone)]
pub struct CouponBuilder {
    coupon: Coupon,
}

impl CouponBuilder {
    pub fn percent(code: impl Into<String>, basis_points: u32) -> Self {
        Self {
            coupon: Coupon {
                code: code.into(),
                discount: DiscountKind::Percent { basis_points },
                apply_at: ApplyAtScope::Checkout,
                applicability: Applicability::AllProducts,
                payment_method: PaymentMethodFilter::AllMethods,
                usage_count: 0,
                usage_cap: None,
            },
        }
    }

    pub fn fixed(code: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            coupon: Coupon {
                code: code.into(),
                discount: DiscountKind::Fixed { amount: amount.into() },
                apply_at: ApplyAtScope::Checkout,
                applicability: Applicability::AllProducts,
                payment_method: PaymentMethodFilter::AllMethods,
                usage_count: 0,
                usage_cap: None,
            },
        }
    }

    #[must_use]
    pub fn apply_at(mut self, scope: ApplyAtScope) -> Self {
        self.coupon.apply_at = scope;
        self
    }

    #[must_use]
    pub fn applicable_to(mut self, products: Vec<String>) -> Self {
        self.coupon.applicability = Applicability::ProductList(products);
        self
    }

    #[must_use]
    pub fn payment_method(mut self, filter: PaymentMethodFilter) -> Self {
        self.coupon.payment_method = filter;
        self
    }

    #[must_use]
    pub fn usage_cap(mut self, cap: u64) -> Self {
        self.coupon.usage_cap = Some(cap);
        self
    }

    pub fn build(self) -> Coupon {
        self.coupon
    }
}

/// Builder for a [`ResourceDefinition`] fixture with an on-chain price.
pub struct ResourceBuilder {
    resource: ResourceDefinition,
}

impl ResourceBuilder {
    pub fn new(resource_id: impl Into<String>, on_chain_asset: Asset, price_major: &str) -> Self {
        Self {
            resource: ResourceDefinition {
                resource_id: resource_id.into(),
                fiat_price: None,
                on_chain_price: Some(OnChainPrice {
                    amount: Money::from_major(on_chain_asset, price_major).expect("fixture price parses"),
                    recipient_token_account: Some("recipient-ata".to_owned()),
                }),
                description: "a test resource".to_owned(),
                memo_template: "{resource_id}".to_owned(),
                metadata: HashMap::new(),
            },
        }
    }

    #[must_use]
    pub fn fiat_price(mut self, fiat_asset: Asset, price_major: &str, external_price_id: impl Into<String>) -> Self {
        self.resource.fiat_price = Some(FiatPrice {
            amount: Money::from_major(fiat_asset, price_major).expect("fixture price parses"),
            external_price_id: external_price_id.into(),
        });
        self
    }

    #[must_use]
    pub fn recipient_token_account(mut self, account: impl Into<String>) -> Self {
        if let Some(price) = &mut self.resource.on_chain_price {
            price.recipient_token_account = Some(account.into());
        }
        self
    }

    pub fn build(self) -> ResourceDefinition {
        self.resource
    }
}
