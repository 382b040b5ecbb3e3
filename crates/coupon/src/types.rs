use serde::{Deserialize, Serialize};

/// The payment rail a quote or authorization is proceeding through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Fiat,
    OnChain,
}

/// Which payment rails a coupon is allowed to apply on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodFilter {
    AllMethods,
    Fiat,
    OnChain,
}

impl PaymentMethodFilter {
    pub fn allows(self, method: PaymentMethod) -> bool {
        match (self, method) {
            (Self::AllMethods, _) => true,
            (Self::Fiat, PaymentMethod::Fiat) => true,
            (Self::OnChain, PaymentMethod::OnChain) => true,
            _ => false,
        }
    }
}

/// Where in the purchase flow a coupon is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyAtScope {
    Catalog,
    Checkout,
}

/// Which products a coupon applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Applicability {
    AllProducts,
    ProductList(Vec<String>),
}

impl Applicability {
    pub fn covers(&self, product_id: &str) -> bool {
        match self {
            Self::AllProducts => true,
            Self::ProductList(ids) => ids.iter().any(|id| id == product_id),
        }
    }
}

/// A coupon's discount shape. `Percent` is basis points of percent (`1000`
/// == 10%, range `0..=10_000`); `Fixed` carries a not-yet-parsed decimal
/// string so it can be resolved against whichever asset the target price
/// turns out to be in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Percent { basis_points: u32 },
    Fixed { amount: String },
}

/// The scope requested when selecting coupons to apply to a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectScope {
    Catalog,
    Checkout,
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub discount: DiscountKind,
    pub apply_at: ApplyAtScope,
    pub applicability: Applicability,
    pub payment_method: PaymentMethodFilter,
    pub usage_count: u64,
    pub usage_cap: Option<u64>,
}

impl Coupon {
    pub fn is_exhausted(&self) -> bool {
        self.usage_cap.is_some_and(|cap| self.usage_count >= cap)
    }

    pub fn applies_to_product(&self, product_id: &str) -> bool {
        self.applicability.covers(product_id)
    }

    pub fn applies_to_method(&self, method: PaymentMethod) -> bool {
        self.payment_method.allows(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applicability_covers_exact_match_only() {
        let list = Applicability::ProductList(vec!["sku_a".to_owned(), "sku_b".to_owned()]);
        assert!(list.covers("sku_a"));
        assert!(!list.covers("sku_c"));
        assert!(Applicability::AllProducts.covers("anything"));
    }

    #[test]
    fn exhaustion_requires_a_cap() {
        let mut coupon = sample_coupon();
        coupon.usage_cap = None;
        coupon.usage_count = 1_000_000;
        assert!(!coupon.is_exhausted());

        coupon.usage_cap = Some(1);
        coupon.usage_count = 1;
        assert!(coupon.is_exhausted());
    }

    fn sample_coupon() -> Coupon {
        Coupon {
            code: "SAVE10".to_owned(),
            discount: DiscountKind::Percent { basis_points: 1_000 },
            apply_at: ApplyAtScope::Checkout,
            applicability: Applicability::AllProducts,
            payment_method: PaymentMethodFilter::AllMethods,
            usage_count: 0,
            usage_cap: None,
        }
    }
}
