use std::collections::HashMap;

use chrono::{DateTime, Utc};
use paywall_money::Money;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub resource_id: String,
    pub quantity: i64,
    pub original_unit_price: Money,
    pub locked_unit_price: Money,
    pub metadata: HashMap<String, String>,
}

/// A locked, immutable cart. Once created, only `paid_by` may be filled in
/// later — every price on it is frozen at creation time regardless of
/// subsequent catalog or coupon changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartQuote {
    pub id: String,
    pub items: Vec<CartItem>,
    pub total: Money,
    pub metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub paid_by: Option<String>,
}

impl CartQuote {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
