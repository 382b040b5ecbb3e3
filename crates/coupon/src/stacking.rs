use paywall_money::{Money, RoundingMode};

use crate::{
    error::Result,
    types::{Coupon, DiscountKind},
};

/// Applies `coupons` to `price` in the fixed two-pass order: every percent
/// coupon first (each folding into the next via [`Money::apply_percentage_discount`]),
/// then the sum of every applicable fixed coupon subtracted once via
/// [`Money::apply_fixed_discount`].
///
/// Percent coupons among themselves commute — the combination is
/// multiplicative — so list order among percents does not change the
/// outcome. Fixed discounts apply after percents because that is the
/// customer-maximizing order under the floor-at-zero rule.
pub fn stack_coupons_on_money(price: &Money, coupons: &[Coupon], rounding: RoundingMode) -> Result<Money> {
    let mut running = price.clone();
    for coupon in coupons {
        if let DiscountKind::Percent { basis_points } = coupon.discount {
            running = running.apply_percentage_discount(basis_points, rounding)?;
        }
    }

    let mut fixed_total = Money::zero(price.asset().clone());
    if price.asset().is_usd_pegged() {
        for coupon in coupons {
            if let DiscountKind::Fixed { amount } = &coupon.discount {
                if let Ok(parsed) = Money::from_major(price.asset().clone(), amount) {
                    fixed_total = fixed_total.checked_add(&parsed)?;
                }
            }
        }
    }

    running.apply_fixed_discount(&fixed_total).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use paywall_money::{Asset, AssetCategory, AssetMetadata};

    use super::*;
    use crate::types::{ApplyAtScope, Applicability, PaymentMethodFilter};

    fn usd() -> Asset {
        Asset::new(
            "USD",
            2,
            AssetCategory::Fiat,
            AssetMetadata::Fiat {
                gateway_currency_code: "usd".to_owned(),
            },
        )
        .unwrap()
    }

    fn sol() -> Asset {
        Asset::new(
            "SOL",
            9,
            AssetCategory::OnChainToken,
            AssetMetadata::OnChainToken {
                mint_address: "So11111111111111111111111111111111111111112".to_owned(),
            },
        )
        .unwrap()
    }

    fn percent(code: &str, bp: u32) -> Coupon {
        Coupon {
            code: code.to_owned(),
            discount: DiscountKind::Percent { basis_points: bp },
            apply_at: ApplyAtScope::Checkout,
            applicability: Applicability::AllProducts,
            payment_method: PaymentMethodFilter::AllMethods,
            usage_count: 0,
            usage_cap: None,
        }
    }

    fn fixed(code: &str, amount: &str) -> Coupon {
        Coupon {
            code: code.to_owned(),
            discount: DiscountKind::Fixed { amount: amount.to_owned() },
            apply_at: ApplyAtScope::Checkout,
            applicability: Applicability::AllProducts,
            payment_method: PaymentMethodFilter::AllMethods,
            usage_count: 0,
            usage_cap: None,
        }
    }

    #[test]
    fn percent_coupons_stack_multiplicatively() {
        let price = Money::from_major(usd(), "100.00").unwrap();
        let coupons = vec![percent("TEN", 1_000), percent("FIVE", 500)];
        let result = stack_coupons_on_money(&price, &coupons, RoundingMode::HalfUp).unwrap();
        // 100 -> 90 (10% off) -> 85.50 (5% off)
        assert_eq!(result.to_major(), "85.50");
    }

    #[test]
    fn percent_order_is_commutative() {
        let price = Money::from_major(usd(), "100.00").unwrap();
        let forward = vec![percent("TEN", 1_000), percent("FIVE", 500)];
        let backward = vec![percent("FIVE", 500), percent("TEN", 1_000)];
        let a = stack_coupons_on_money(&price, &forward, RoundingMode::HalfUp).unwrap();
        let b = stack_coupons_on_money(&price, &backward, RoundingMode::HalfUp).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fixed_discount_applies_after_percent() {
        let price = Money::from_major(usd(), "100.00").unwrap();
        let coupons = vec![percent("TEN", 1_000), fixed("FIVEOFF", "5.00")];
        let result = stack_coupons_on_money(&price, &coupons, RoundingMode::HalfUp).unwrap();
        assert_eq!(result.to_major(), "85.00");
    }

    #[test]
    fn fixed_discount_skipped_when_not_usd_pegged() {
        let price = Money::from_major(sol(), "2.000000000").unwrap();
        let coupons = vec![fixed("FIVEOFF", "5.00")];
        let result = stack_coupons_on_money(&price, &coupons, RoundingMode::HalfUp).unwrap();
        assert_eq!(result, price);
    }

    #[test]
    fn unparseable_fixed_discount_is_skipped() {
        let price = Money::from_major(usd(), "10.00").unwrap();
        let coupons = vec![fixed("BAD", "not-a-number")];
        let result = stack_coupons_on_money(&price, &coupons, RoundingMode::HalfUp).unwrap();
        assert_eq!(result, price);
    }

    #[test]
    fn fixed_discount_floors_at_zero() {
        let price = Money::from_major(usd(), "3.00").unwrap();
        let coupons = vec![fixed("HUGE", "100.00")];
        let result = stack_coupons_on_money(&price, &coupons, RoundingMode::HalfUp).unwrap();
        assert_eq!(result.atomic(), 0);
    }
}
