use chrono::Duration;

/// Runtime-tunable parameters for quote generation. Loading these from an
/// external config source is out of scope here; callers construct a
/// [`QuoteConfig`] however they see fit and pass it in.
#[derive(Debug, Clone)]
pub struct QuoteConfig {
    pub scheme: String,
    pub network: String,
    pub memo_prefix: String,
    pub quote_ttl: Duration,
    pub max_timeout_seconds: u64,
    pub fee_sponsorship_enabled: bool,
    pub server_fee_payer: Option<String>,
    pub payout_wallet: String,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            scheme: "solana-spl-transfer".to_owned(),
            network: "solana-mainnet".to_owned(),
            memo_prefix: "paywall".to_owned(),
            quote_ttl: Duration::minutes(10),
            max_timeout_seconds: 120,
            fee_sponsorship_enabled: false,
            server_fee_payer: None,
            payout_wallet: String::new(),
        }
    }
}
