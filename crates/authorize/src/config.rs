use std::time::Duration;

use chrono::Duration as ChronoDuration;
use paywall_quote::QuoteConfig;
use solana_commitment_config::CommitmentConfig;

/// Runtime-tunable parameters for the authorization service, layered on top
/// of [`QuoteConfig`]. Loading these from environment/files is out of
/// scope — callers construct an [`AuthorizeConfig`] however they see fit and
/// pass it in.
#[derive(Debug, Clone)]
pub struct AuthorizeConfig {
    pub quote: QuoteConfig,
    /// The server's payout wallet owner address. Purchases must land here;
    /// refunds must be sent from here.
    pub payout_wallet: String,
    pub commitment: CommitmentConfig,
    pub skip_preflight: bool,
    pub auto_create_ata: bool,
    pub rpc_poll_interval: Duration,
    pub default_confirmation_timeout: Duration,
    pub default_access_ttl: ChronoDuration,
    /// Absolute-difference tolerance, in the asset's smallest unit, applied
    /// only on the cart path to absorb the major-unit float round-trip at
    /// the verifier boundary. The single-resource and refund paths always
    /// require exact equality.
    pub cart_amount_tolerance_atomic: i64,
}

impl Default for AuthorizeConfig {
    fn default() -> Self {
        Self {
            quote: QuoteConfig::default(),
            payout_wallet: String::new(),
            commitment: CommitmentConfig::confirmed(),
            skip_preflight: false,
            auto_create_ata: true,
            rpc_poll_interval: Duration::from_secs(2),
            default_confirmation_timeout: Duration::from_secs(120),
            default_access_ttl: ChronoDuration::minutes(10),
            cart_amount_tolerance_atomic: 1,
        }
    }
}

impl AuthorizeConfig {
    /// `max(quote_ttl, default_confirmation_timeout)` — the nominal
    /// confirmation window a caller should budget for this request,
    /// independent of the verifier's own fixed blockhash-validity deadline.
    pub fn confirmation_timeout(&self) -> Duration {
        let quote_ttl = self.quote.quote_ttl.to_std().unwrap_or(self.default_confirmation_timeout);
        quote_ttl.max(self.default_confirmation_timeout)
    }

    /// `now + max(quote_ttl, default_access_ttl)`, the access-grant expiry
    /// attached to a successful settlement.
    pub fn access_expires_at(&self, now: chrono::DateTime<chrono::Utc>) -> chrono::DateTime<chrono::Utc> {
        now + self.quote.quote_ttl.max(self.default_access_ttl)
    }
}
