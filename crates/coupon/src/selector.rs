use crate::types::{ApplyAtScope, Applicability, Coupon, PaymentMethod, SelectScope};

/// Builds the final coupon list for a payment: every matching auto-apply
/// coupon from `candidates`, plus `manual` if supplied and still
/// applicable, deduplicated by code (first occurrence wins).
///
/// - `scope=Catalog` keeps only `apply_at=Catalog` coupons.
/// - `scope=Checkout` keeps only `apply_at=Checkout` coupons that are also
///   `AllProducts`; the manual coupon must independently be `AllProducts`.
/// - `scope=All` applies no apply-at filter.
///
/// A manual coupon that fails payment-method applicability is silently
/// dropped rather than surfaced as an error.
pub fn select_coupons_for_payment(
    candidates: &[Coupon],
    product_id: &str,
    method: PaymentMethod,
    manual: Option<Coupon>,
    scope: SelectScope,
) -> Vec<Coupon> {
    let scope_ok = |coupon: &Coupon| match scope {
        SelectScope::Catalog => coupon.apply_at == ApplyAtScope::Catalog,
        SelectScope::Checkout => {
            coupon.apply_at == ApplyAtScope::Checkout && coupon.applicability == Applicability::AllProducts
        }
        SelectScope::All => true,
    };

    let mut selected = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for coupon in candidates {
        if !scope_ok(coupon) {
            continue;
        }
        if !coupon.applies_to_product(product_id) || !coupon.applies_to_method(method) || coupon.is_exhausted() {
            continue;
        }
        if seen.insert(coupon.code.clone()) {
            selected.push(coupon.clone());
        }
    }

    if let Some(manual) = manual {
        let manual_scope_ok = !matches!(scope, SelectScope::Checkout) || manual.applicability == Applicability::AllProducts;
        if manual_scope_ok
            && manual.applies_to_product(product_id)
            && manual.applies_to_method(method)
            && !manual.is_exhausted()
            && seen.insert(manual.code.clone())
        {
            selected.push(manual);
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DiscountKind, PaymentMethodFilter};

    fn coupon(code: &str, apply_at: ApplyAtScope, applicability: Applicability) -> Coupon {
        Coupon {
            code: code.to_owned(),
            discount: DiscountKind::Percent { basis_points: 500 },
            apply_at,
            applicability,
            payment_method: PaymentMethodFilter::AllMethods,
            usage_count: 0,
            usage_cap: None,
        }
    }

    #[test]
    fn catalog_scope_keeps_only_catalog_coupons() {
        let candidates = vec![
            coupon("CAT", ApplyAtScope::Catalog, Applicability::AllProducts),
            coupon("CHK", ApplyAtScope::Checkout, Applicability::AllProducts),
        ];
        let selected = select_coupons_for_payment(&candidates, "sku_a", PaymentMethod::OnChain, None, SelectScope::Catalog);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].code, "CAT");
    }

    #[test]
    fn checkout_scope_requires_all_products() {
        let candidates = vec![
            coupon(
                "SCOPED",
                ApplyAtScope::Checkout,
                Applicability::ProductList(vec!["sku_a".to_owned()]),
            ),
            coupon("GLOBAL", ApplyAtScope::Checkout, Applicability::AllProducts),
        ];
        let selected = select_coupons_for_payment(&candidates, "sku_a", PaymentMethod::OnChain, None, SelectScope::Checkout);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].code, "GLOBAL");
    }

    #[test]
    fn manual_coupon_failing_method_filter_is_silently_dropped() {
        let mut manual = coupon("MANUAL", ApplyAtScope::Checkout, Applicability::AllProducts);
        manual.payment_method = PaymentMethodFilter::Fiat;
        let selected = select_coupons_for_payment(&[], "sku_a", PaymentMethod::OnChain, Some(manual), SelectScope::All);
        assert!(selected.is_empty());
    }

    #[test]
    fn duplicate_codes_deduplicate_auto_before_manual() {
        let auto = coupon("SAME", ApplyAtScope::Checkout, Applicability::AllProducts);
        let manual = coupon("SAME", ApplyAtScope::Checkout, Applicability::AllProducts);
        let selected = select_coupons_for_payment(&[auto], "sku_a", PaymentMethod::OnChain, Some(manual), SelectScope::All);
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn exhausted_coupons_are_excluded() {
        let mut coupon = coupon("USED_UP", ApplyAtScope::Checkout, Applicability::AllProducts);
        coupon.usage_cap = Some(1);
        coupon.usage_count = 1;
        let selected = select_coupons_for_payment(&[coupon], "sku_a", PaymentMethod::OnChain, None, SelectScope::All);
        assert!(selected.is_empty());
    }
}
