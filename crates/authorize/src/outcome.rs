use chrono::{DateTime, Utc};
use paywall_quote::{FiatQuote, OnChainQuote};

/// What the caller hands back to the protocol-compliant response headers
/// after a grant: `{success, tx_hash, network_id}` plus the access window
/// the grant is valid for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub success: bool,
    pub tx_hash: String,
    pub network_id: String,
    pub access_expires_at: DateTime<Utc>,
}

/// The result of one `authorize()` call. Every dispatch path (single
/// resource, cart, refund) resolves to exactly one of these three shapes.
#[derive(Debug, Clone)]
pub enum AuthorizationOutcome {
    /// Granted without an on-chain settlement: either a fiat checkout quote
    /// was presented for later confirmation, or an injected subscription
    /// checker already reported access (in which case `fiat_quote` is
    /// `None`).
    GrantedFiat { fiat_quote: Option<FiatQuote> },

    /// Granted via a confirmed on-chain payment.
    GrantedOnChain { settlement: Settlement },

    /// Not granted; the caller should present `on_chain_quote` and/or
    /// `fiat_quote` to the client as the 402 payment-requirements body.
    NotGranted {
        on_chain_quote: Option<OnChainQuote>,
        fiat_quote: Option<FiatQuote>,
    },
}
