use std::collections::HashMap;

use paywall_money::Money;
use serde::{Deserialize, Serialize};

/// A resource's price in the fiat-gateway's unit of account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiatPrice {
    pub amount: Money,
    pub external_price_id: String,
}

/// A resource's price on-chain, with an optional explicit recipient token
/// account (when absent, the verifier derives it from owner + mint).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnChainPrice {
    pub amount: Money,
    pub recipient_token_account: Option<String>,
}

/// A sellable thing: catalog metadata plus up to two independent prices
/// (fiat and on-chain). At least one must be set for the resource to be
/// purchasable by the corresponding path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub resource_id: String,
    pub fiat_price: Option<FiatPrice>,
    pub on_chain_price: Option<OnChainPrice>,
    pub description: String,
    pub memo_template: String,
    pub metadata: HashMap<String, String>,
}

impl ResourceDefinition {
    pub fn memo(&self) -> String {
        self.memo_template.replace("{resource_id}", &self.resource_id)
    }
}
