use std::collections::HashMap;

use chrono::{DateTime, Utc};
use paywall_money::Money;
use serde::{Deserialize, Serialize};

/// A refund request. Unlike [`crate::cart::CartQuote`], a refund request
/// never auto-expires out of existence — `expires_at` only bounds the
/// on-chain blockhash validity window for the *current* regeneration, not
/// the request's lifecycle. The request lives until sealed or denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundQuote {
    pub id: String,
    pub original_signature: String,
    pub recipient_wallet: String,
    pub amount: Money,
    pub reason: Option<String>,
    pub metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub processed_by: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub executing_signature: Option<String>,
}

impl RefundQuote {
    pub fn is_sealed(&self) -> bool {
        self.processed_at.is_some()
    }
}
