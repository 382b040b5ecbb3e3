use std::collections::HashMap;

use chrono::{DateTime, Utc};
use paywall_money::Money;
use serde::{Deserialize, Serialize};

/// Mirrors the ledger row's mutable `metadata.status` field: a row is a
/// placeholder (claimable, overwritable) while `Verifying`, and sealed
/// (append-only) once `Verified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Verifying,
    Verified,
}

/// A single ledger row, keyed by its globally unique on-chain signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub signature: String,
    pub resource_id: String,
    pub wallet: String,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
    pub status: PaymentStatus,
    pub metadata: HashMap<String, String>,
}

impl PaymentTransaction {
    /// A row with an empty wallet or a `Verifying` status is a placeholder:
    /// reserved against replay but not yet a confirmed payment, and so may
    /// be overwritten by the eventual sealed row for the same signature.
    pub fn is_placeholder(&self) -> bool {
        self.wallet.is_empty() || self.status == PaymentStatus::Verifying
    }

    pub fn is_sealed(&self) -> bool {
        !self.is_placeholder()
    }
}
