use chrono::Duration;
use solana_commitment_config::CommitmentConfig;

use crate::envelope::Scheme;

/// Everything the verifier needs to judge a single proof, independent of
/// the proof itself: what was quoted, where it must land, and how picky to
/// be about confirmation.
#[derive(Debug, Clone)]
pub struct Requirement {
    pub resource_id: String,
    /// Minimum acceptable amount in major units (e.g. `9.99`), matching the
    /// major-unit float boundary the verifier converts the raw on-chain
    /// amount into before comparing. A transfer below this floor fails
    /// verification outright with `AmountBelowMinimum`; callers that
    /// perform their own exact/tolerance-bounded match afterward (as
    /// `paywall_authorize` does) should leave this at `0.0` so an
    /// underpayment surfaces there instead, with both figures in the
    /// message.
    pub expected_amount: f64,
    pub mint: String,
    pub decimals: u8,
    pub recipient_owner: String,
    pub recipient_token_account: Option<String>,
    pub network: String,
    pub allowed_schemes: Vec<Scheme>,
    pub commitment: CommitmentConfig,
    pub skip_preflight: bool,
    pub quote_ttl: Duration,
    /// Whether a missing recipient associated-token-account should be
    /// created (server-paid) before a sponsored transaction is broadcast.
    pub auto_create_ata: bool,
}

/// `raw / 10^decimals + ε ≥ required` is satisfied with this tolerance to
/// absorb the float round-trip at the major-unit boundary.
pub const AMOUNT_EPSILON: f64 = 1e-9;
