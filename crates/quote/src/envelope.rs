use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Extra, scheme-specific fields nested inside an [`OnChainQuote`].
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extra {
    #[serde(rename = "recipientTokenAccount")]
    pub recipient_token_account: String,
    pub decimals: u8,
    #[serde(rename = "tokenSymbol")]
    pub token_symbol: String,
    pub memo: String,
    #[serde(rename = "feePayer")]
    pub fee_payer: Option<String>,
    pub original_amount: Option<String>,
    pub discounted_amount: Option<String>,
    pub applied_coupons: Option<Vec<String>>,
    pub catalog_coupons: Option<Vec<String>>,
    pub checkout_coupons: Option<Vec<String>>,
}

/// The on-chain payment-requirements envelope returned in a 402 body (or
/// embedded as the `accepts[]` entry of an x402-compliant response).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnChainQuote {
    pub scheme: String,
    pub network: String,
    pub max_amount_required: String,
    pub resource: String,
    pub description: String,
    pub mime_type: String,
    pub pay_to: String,
    pub asset: String,
    pub max_timeout_seconds: u64,
    pub extra: Extra,
}

/// A fiat checkout option attached to a single-resource quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiatQuote {
    pub external_price_id: String,
    pub amount: String,
    pub currency: String,
}
